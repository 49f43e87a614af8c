//! Per-chunk XChaCha20-Poly1305 encryption/decryption.
//!
//! Encrypted chunk format (binary):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! AAD = chunk_index (8 bytes, big-endian) || document_digest (32 bytes)
//! ```
//!
//! The AAD binds each chunk to its position and document, so chunks cannot
//! be reordered or substituted across documents without the tag failing.
//! Every chunk is independently verifiable: tampering with one chunk never
//! affects the others.
//!
//! Nonces are always drawn fresh from the system CSPRNG per call. There is
//! no counter state anywhere, so nonce reuse across chunks or keys is
//! structurally impossible.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use pv_core::{DocumentId, VaultError, VaultResult};

use crate::keys::ContentKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// BLAKE3 digest of the plaintext document; used as the document
/// identifier and as the document half of the chunk AAD.
pub fn document_digest(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Decode a [`DocumentId`] back into digest bytes for AAD construction.
pub fn digest_from_id(id: &DocumentId) -> VaultResult<[u8; 32]> {
    let bytes = hex::decode(&id.0)
        .map_err(|_| VaultError::MalformedKeyMaterial("document id is not hex".into()))?;
    bytes.try_into().map_err(|_| {
        VaultError::MalformedKeyMaterial("document id is not a 32-byte digest".into())
    })
}

/// Split a document into fixed-size plaintext chunks.
///
/// All chunks are `chunk_size` bytes except the last, which may be
/// shorter. An empty document yields one empty chunk so that every
/// document has at least one addressable ciphertext.
pub fn split_document(data: &[u8], chunk_size: usize) -> VaultResult<Vec<&[u8]>> {
    if chunk_size == 0 {
        return Err(VaultError::MalformedInput("chunk size must be > 0".into()));
    }
    if data.is_empty() {
        return Ok(vec![&[]]);
    }
    Ok(data.chunks(chunk_size).collect())
}

/// Encrypt a single chunk with XChaCha20-Poly1305.
///
/// Returns `[24-byte nonce][ciphertext][16-byte tag]`.
pub fn encrypt_chunk(
    key: &ContentKey,
    chunk_index: u64,
    document_digest: &[u8; 32],
    plaintext: &[u8],
) -> VaultResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let aad = build_aad(chunk_index, document_digest);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|_| VaultError::MalformedInput("chunk encryption failed".into()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt a single chunk with XChaCha20-Poly1305.
///
/// A tag mismatch (tamper, wrong key, wrong index, wrong document) is
/// fatal for that chunk: `AuthenticationFailure`, never partial plaintext.
pub fn decrypt_chunk(
    key: &ContentKey,
    chunk_index: u64,
    document_digest: &[u8; 32],
    encrypted: &[u8],
) -> VaultResult<Vec<u8>> {
    if encrypted.len() < NONCE_SIZE + TAG_SIZE {
        return Err(VaultError::MalformedInput(format!(
            "encrypted chunk too short: {} bytes (minimum {})",
            encrypted.len(),
            NONCE_SIZE + TAG_SIZE
        )));
    }

    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let aad = build_aad(chunk_index, document_digest);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: &aad,
            },
        )
        .map_err(|_| VaultError::AuthenticationFailure)
}

/// Reassemble a document from decrypted `(index, plaintext)` chunks.
///
/// Requires every index `0..N-1` exactly once. Missing or duplicated
/// indices are `MalformedInput`, never silently skipped.
pub fn reassemble(mut chunks: Vec<(u64, Vec<u8>)>) -> VaultResult<Vec<u8>> {
    chunks.sort_by_key(|(index, _)| *index);

    let mut document = Vec::with_capacity(chunks.iter().map(|(_, c)| c.len()).sum());
    for (expected, (index, chunk)) in chunks.into_iter().enumerate() {
        if index != expected as u64 {
            return Err(VaultError::MalformedInput(format!(
                "chunk index {index} where {expected} was expected (missing or duplicate chunk)"
            )));
        }
        document.extend_from_slice(&chunk);
    }
    Ok(document)
}

/// Build AAD: chunk_index (8 bytes BE) || document_digest (32 bytes).
fn build_aad(chunk_index: u64, document_digest: &[u8; 32]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(8 + 32);
    aad.extend_from_slice(&chunk_index.to_be_bytes());
    aad.extend_from_slice(document_digest);
    aad
}
