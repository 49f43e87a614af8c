//! Key hierarchy: content key (K1), master key (K2), and key wrapping.
//!
//! The wrapped content key is the indirection that lets custody of the
//! master key change without re-encrypting any chunk: rotate K2, re-wrap
//! K1, leave the chunk set untouched.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use zeroize::Zeroize;

use pv_core::{VaultError, VaultResult};

use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// Per-document 256-bit content key (K1).
///
/// Exists in plaintext only transiently in process memory; zeroized on drop.
#[derive(Clone)]
pub struct ContentKey {
    bytes: [u8; KEY_SIZE],
}

impl ContentKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// 256-bit master key (K2) protecting a content key.
///
/// Never persisted directly — only its Shamir shares are. Zeroized on drop.
#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random content key from the system CSPRNG.
pub fn generate_content_key() -> ContentKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    ContentKey::from_bytes(bytes)
}

/// Generate a random master key from the system CSPRNG.
pub fn generate_master_key() -> MasterKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    MasterKey::from_bytes(bytes)
}

/// Wrap (encrypt) the content key under the master key.
///
/// Uses XChaCha20-Poly1305 with a random nonce.
/// Output: `[24-byte nonce][ciphertext + 16-byte tag]`, safe to persist
/// publicly — useless without K2.
pub fn wrap_key(master: &MasterKey, content: &ContentKey) -> VaultResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(master.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, content.as_bytes().as_ref())
        .map_err(|_| VaultError::MalformedKeyMaterial("key wrapping failed".into()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Unwrap (decrypt) a content key using the master key.
///
/// Any master key other than the wrapping one fails with
/// `AuthenticationFailure` — never a plausible-looking wrong key.
pub fn unwrap_key(master: &MasterKey, wrapped: &[u8]) -> VaultResult<ContentKey> {
    if wrapped.len() != NONCE_SIZE + KEY_SIZE + TAG_SIZE {
        return Err(VaultError::MalformedKeyMaterial(format!(
            "wrapped key has {} bytes (expected {})",
            wrapped.len(),
            NONCE_SIZE + KEY_SIZE + TAG_SIZE
        )));
    }

    let (nonce_bytes, ciphertext) = wrapped.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new(master.as_bytes().into());

    let mut plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::AuthenticationFailure)?;

    if plaintext.len() != KEY_SIZE {
        plaintext.zeroize();
        return Err(VaultError::MalformedKeyMaterial(format!(
            "unwrapped key has {} bytes (expected {KEY_SIZE})",
            plaintext.len()
        )));
    }

    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&plaintext);
    plaintext.zeroize();

    Ok(ContentKey::from_bytes(key_bytes))
}
