//! Deterministic per-identity keypairs and sealed-box transport.
//!
//! A custodian never stores a private key. Each session they sign the
//! canonical role challenge with their wallet; the 65-byte signature is
//! the only input to key derivation, so the same (identity, challenge)
//! pair re-derives byte-identical keys on any machine, forever.
//!
//! Derivation path: signature bytes → HKDF-SHA256 (deterministic
//! expansion, no system RNG anywhere in this path) → 32-byte seed →
//! X25519 static secret. Drawing from a non-deterministic RNG here would
//! permanently strand everything sealed to the resulting public key.
//!
//! Sealed box format (payload of a `Sealed` wire frame):
//! ```text
//! [32 bytes: ephemeral X25519 public][24 bytes: nonce][ciphertext + 16-byte tag]
//! ```
//! Payloads are bounded by [`MAX_SEALED_PAYLOAD`](crate::MAX_SEALED_PAYLOAD);
//! oversized input is `PayloadTooLarge`, never truncated.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use pv_core::{VaultError, VaultResult};

use crate::{KEY_SIZE, MAX_SEALED_PAYLOAD, NONCE_SIZE, TAG_SIZE};

/// Length of a recoverable secp256k1 wallet signature.
const SIGNATURE_LEN: usize = 65;

/// HKDF domain for keypair seeds.
const KEYPAIR_INFO: &[u8] = b"papervault/identity-keypair/v1";

/// HKDF domain for sealed-box symmetric keys.
const SEALED_INFO: &[u8] = b"papervault/sealed-box/v1";

/// An identity keypair derived from a challenge signature.
///
/// Holds the only copy of the private scalar; it is never serialized or
/// cached. Callers derive it, use it, and drop it — re-derivation from a
/// fresh signature is cheap and exact.
pub struct IdentityKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl IdentityKeyPair {
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Deterministically derive an identity keypair from a wallet signature.
///
/// The signature must be the `0x`-prefixed hex encoding of a 65-byte
/// recoverable signature over the role challenge; anything else is
/// `KeyDerivationFailure`. Identical signatures yield byte-identical
/// keys; distinct signatures yield independent keys.
pub fn derive_keypair(signature: &str) -> VaultResult<IdentityKeyPair> {
    let mut sig_bytes = decode_signature(signature)?;

    let hk = Hkdf::<Sha256>::new(None, &sig_bytes);
    let mut seed = [0u8; KEY_SIZE];
    hk.expand(KEYPAIR_INFO, &mut seed)
        .map_err(|_| VaultError::KeyDerivationFailure("HKDF expand failed".into()))?;
    sig_bytes.zeroize();

    let secret = StaticSecret::from(seed);
    seed.zeroize();
    let public = PublicKey::from(&secret);

    Ok(IdentityKeyPair { secret, public })
}

fn decode_signature(signature: &str) -> VaultResult<Vec<u8>> {
    let hex_part = signature.strip_prefix("0x").ok_or_else(|| {
        VaultError::KeyDerivationFailure("signature missing 0x prefix".into())
    })?;

    let bytes = hex::decode(hex_part)
        .map_err(|_| VaultError::KeyDerivationFailure("signature is not hex".into()))?;

    if bytes.len() != SIGNATURE_LEN {
        return Err(VaultError::KeyDerivationFailure(format!(
            "signature has {} bytes (expected {SIGNATURE_LEN})",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Encrypt a short secret to an identity's public key.
///
/// Ephemeral-static X25519 followed by XChaCha20-Poly1305; only the
/// holder of the derived private key can open it. Fails with
/// `PayloadTooLarge` above the payload bound.
pub fn seal_for_identity(secret: &[u8], recipient: &PublicKey) -> VaultResult<Vec<u8>> {
    if secret.len() > MAX_SEALED_PAYLOAD {
        return Err(VaultError::PayloadTooLarge {
            len: secret.len(),
            max: MAX_SEALED_PAYLOAD,
        });
    }

    // Ephemeral key is single-use; randomness here does not affect
    // re-derivability of the recipient keypair.
    let ephemeral = StaticSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);

    let shared = ephemeral.diffie_hellman(recipient);
    let key = sealed_box_key(shared.as_bytes(), &ephemeral_public, recipient)?;
    let cipher = XChaCha20Poly1305::new(&key.into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, secret)
        .map_err(|_| VaultError::MalformedKeyMaterial("sealing failed".into()))?;

    let mut sealed = Vec::with_capacity(32 + NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(ephemeral_public.as_bytes());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a sealed secret with the recipient's identity keypair.
///
/// Shape errors are `MalformedKeyMaterial`; a tag failure is
/// `AuthenticationFailure` and must not be retried with the same material.
pub fn open_for_identity(sealed: &[u8], keypair: &IdentityKeyPair) -> VaultResult<Vec<u8>> {
    if sealed.len() < 32 + NONCE_SIZE + TAG_SIZE {
        return Err(VaultError::MalformedKeyMaterial(format!(
            "sealed payload too short: {} bytes",
            sealed.len()
        )));
    }

    let (ephemeral_bytes, rest) = sealed.split_at(32);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

    let ephemeral_array: [u8; 32] = ephemeral_bytes
        .try_into()
        .expect("split_at(32) yields 32 bytes");
    let ephemeral_public = PublicKey::from(ephemeral_array);

    let shared = keypair.secret.diffie_hellman(&ephemeral_public);
    let key = sealed_box_key(shared.as_bytes(), &ephemeral_public, &keypair.public)?;
    let cipher = XChaCha20Poly1305::new(&key.into());
    let nonce = XNonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::AuthenticationFailure)
}

/// Derive the sealed-box AEAD key, binding both public keys into the
/// transcript so a ciphertext cannot be re-targeted.
fn sealed_box_key(
    shared: &[u8; 32],
    ephemeral: &PublicKey,
    recipient: &PublicKey,
) -> VaultResult<[u8; KEY_SIZE]> {
    let mut info = Vec::with_capacity(SEALED_INFO.len() + 64);
    info.extend_from_slice(SEALED_INFO);
    info.extend_from_slice(ephemeral.as_bytes());
    info.extend_from_slice(recipient.as_bytes());

    let hk = Hkdf::<Sha256>::new(None, shared);
    let mut key = [0u8; KEY_SIZE];
    hk.expand(&info, &mut key)
        .map_err(|_| VaultError::KeyDerivationFailure("HKDF expand failed".into()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signature(fill: u8) -> String {
        format!("0x{}", hex::encode([fill; SIGNATURE_LEN]))
    }

    #[test]
    fn derivation_is_deterministic() {
        let sig = test_signature(0xA7);
        let kp1 = derive_keypair(&sig).unwrap();
        let kp2 = derive_keypair(&sig).unwrap();

        assert_eq!(kp1.public_key_bytes(), kp2.public_key_bytes());
        assert_eq!(kp1.secret.to_bytes(), kp2.secret.to_bytes());
    }

    #[test]
    fn distinct_signatures_yield_distinct_keys() {
        let kp1 = derive_keypair(&test_signature(0x01)).unwrap();
        let kp2 = derive_keypair(&test_signature(0x02)).unwrap();
        assert_ne!(kp1.public_key_bytes(), kp2.public_key_bytes());
    }

    #[test]
    fn malformed_signatures_are_key_derivation_failures() {
        let wrong_length = format!("0x{}", hex::encode([1u8; 64]));
        for bad in ["", "deadbeef", "0xzz", wrong_length.as_str()] {
            let err = derive_keypair(bad).unwrap_err();
            assert!(
                matches!(err, VaultError::KeyDerivationFailure(_)),
                "expected KeyDerivationFailure for {bad:?}"
            );
        }
    }

    #[test]
    fn seal_open_roundtrip() {
        let kp = derive_keypair(&test_signature(0x33)).unwrap();
        let secret = b"a 33-byte share goes here........";

        let sealed = seal_for_identity(secret, kp.public_key()).unwrap();
        let opened = open_for_identity(&sealed, &kp).unwrap();

        assert_eq!(opened, secret);
    }

    #[test]
    fn roundtrip_at_exact_bound() {
        let kp = derive_keypair(&test_signature(0x44)).unwrap();
        let secret = vec![0x5A; MAX_SEALED_PAYLOAD];

        let sealed = seal_for_identity(&secret, kp.public_key()).unwrap();
        assert_eq!(open_for_identity(&sealed, &kp).unwrap(), secret);
    }

    #[test]
    fn oversized_payload_rejected() {
        let kp = derive_keypair(&test_signature(0x55)).unwrap();
        let secret = vec![0u8; MAX_SEALED_PAYLOAD + 1];

        let err = seal_for_identity(&secret, kp.public_key()).unwrap_err();
        assert!(matches!(
            err,
            VaultError::PayloadTooLarge { len, max }
                if len == MAX_SEALED_PAYLOAD + 1 && max == MAX_SEALED_PAYLOAD
        ));
    }

    #[test]
    fn wrong_recipient_cannot_open() {
        let sender_target = derive_keypair(&test_signature(0x66)).unwrap();
        let other = derive_keypair(&test_signature(0x77)).unwrap();

        let sealed = seal_for_identity(b"share", sender_target.public_key()).unwrap();
        let err = open_for_identity(&sealed, &other).unwrap_err();
        assert!(matches!(err, VaultError::AuthenticationFailure));
    }

    #[test]
    fn tampered_sealed_payload_fails() {
        let kp = derive_keypair(&test_signature(0x88)).unwrap();
        let mut sealed = seal_for_identity(b"share", kp.public_key()).unwrap();

        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        let err = open_for_identity(&sealed, &kp).unwrap_err();
        assert!(matches!(err, VaultError::AuthenticationFailure));
    }

    #[test]
    fn short_sealed_payload_is_malformed() {
        let kp = derive_keypair(&test_signature(0x99)).unwrap();
        let err = open_for_identity(&[0u8; 16], &kp).unwrap_err();
        assert!(matches!(err, VaultError::MalformedKeyMaterial(_)));
    }
}
