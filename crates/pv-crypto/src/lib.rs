//! pv-crypto: escrow cryptography for papervault
//!
//! Pipeline: plaintext → fixed-size chunk → encrypt (XChaCha20-Poly1305) →
//! content-address by BLAKE3 → upload. Disclosure inverts it after the
//! master key is reconstructed from custodian shares.
//!
//! Key hierarchy:
//! ```text
//! Master Key K2 (256-bit random, never persisted directly)
//!   ├── split into (n, t) Shamir shares, one sealed per custodian
//!   └── wraps the Content Key K1 (XChaCha20-Poly1305)
//! Content Key K1 (per-document, 256-bit random)
//!   └── Chunk AEAD: XChaCha20-Poly1305 (nonce=random_192bit, AAD=index||doc_digest)
//! Identity Keypair (X25519, HKDF-SHA256 from a role-challenge signature)
//!   └── sealed box carrying shares/keys across trust boundaries
//! ```

pub mod chunk;
pub mod identity;
pub mod keys;
pub mod shamir;
pub mod wire;

pub use chunk::{
    decrypt_chunk, digest_from_id, document_digest, encrypt_chunk, reassemble, split_document,
};
pub use identity::{derive_keypair, open_for_identity, seal_for_identity, IdentityKeyPair};
pub use x25519_dalek::PublicKey;
pub use keys::{generate_content_key, generate_master_key, unwrap_key, wrap_key, ContentKey, MasterKey};
pub use shamir::{combine_shares, split_master_key, KeyShare};

/// Size of a symmetric key in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit).
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag.
pub const TAG_SIZE: usize = 16;

/// Encoded size of one key share: index byte + 32 value bytes.
pub const SHARE_SIZE: usize = 1 + KEY_SIZE;

/// Upper bound on a sealed-box plaintext. Key material crossing a trust
/// boundary is always short (keys, shares, wrapped keys); anything larger
/// is a caller bug surfaced as `PayloadTooLarge`, never truncated.
pub const MAX_SEALED_PAYLOAD: usize = 256;
