//! Signing provider interface.
//!
//! Signatures come from an external wallet; this crate only consumes the
//! resulting bytes and never touches the signer's key custody.

use pv_core::VaultResult;

pub trait Signer: Send + Sync {
    /// Sign a challenge message, returning a `0x`-prefixed hex encoding
    /// of a 65-byte recoverable signature.
    fn sign(&self, message: &str) -> impl std::future::Future<Output = VaultResult<String>> + Send;
}

/// Test double producing stable wallet-style signatures.
///
/// Keyed BLAKE3 of the message, expanded to 65 bytes: the same (seed,
/// message) pair always signs identically, and different seeds behave
/// like different wallets. Not a real signature scheme.
pub struct DeterministicSigner {
    seed: [u8; 32],
}

impl DeterministicSigner {
    pub fn new(seed: [u8; 32]) -> Self {
        Self { seed }
    }
}

impl Signer for DeterministicSigner {
    async fn sign(&self, message: &str) -> VaultResult<String> {
        let mut sig = [0u8; 65];
        let mut reader = blake3::Hasher::new_keyed(&self.seed)
            .update(message.as_bytes())
            .finalize_xof();
        reader.fill(&mut sig);
        Ok(format!("0x{}", hex::encode(sig)))
    }
}
