use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Error taxonomy for the escrow and disclosure pipeline.
///
/// Cryptographic failures are never downgraded to a default value; they
/// propagate as one of these variants. Only `Store` is transient and
/// eligible for retry with backoff — authorization and authentication
/// failures must never be retried automatically.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Bad sizes, missing or duplicate chunk indices, invalid share counts.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// AEAD tag or sealed-box mismatch. Fatal for the material involved.
    #[error("authentication failure: ciphertext or tag rejected")]
    AuthenticationFailure,

    /// Fewer shares supplied than the reconstruction threshold requires.
    #[error("insufficient shares: got {got}, need {need}")]
    InsufficientShares { got: usize, need: usize },

    /// Interpolation produced a candidate secret that failed the integrity
    /// check. Treat the supplied shares as corrupted or forged.
    #[error("share reconstruction mismatch: recovered key failed integrity check")]
    ReconstructionMismatch,

    /// Signature did not match the expected challenge format.
    #[error("key derivation failure: {0}")]
    KeyDerivationFailure(String),

    /// Ledger authorization not yet granted for this document.
    #[error("unauthorized disclosure: unlock time {unlock_time} not reached (ledger time {now})")]
    UnauthorizedDisclosure { unlock_time: u64, now: u64 },

    /// Externally supplied key bytes failed shape, length, or frame checks.
    #[error("malformed key material: {0}")]
    MalformedKeyMaterial(String),

    /// Plaintext exceeds the sealed-box payload bound.
    #[error("payload too large for identity encryption: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// Content-store failure (transient; retried with backoff).
    #[error("content store error: {0}")]
    Store(String),

    /// Ledger read or mutation failure.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// External signing provider failure.
    #[error("signer error: {0}")]
    Signer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Whether a retry with backoff is permitted for this error.
    ///
    /// A chunk-fetch failure is distinct from a decryption failure and is
    /// the only class the pipeline retries on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, VaultError::Store(_))
    }
}
