//! pv-store: content-addressed storage for encrypted chunks.
//!
//! The store only ever sees ciphertext; content keys never cross this
//! boundary. Blobs are addressed by the BLAKE3 hash of their bytes, so a
//! fetched blob can always be checked against its own address.

pub mod memory;
pub mod retry;
pub mod s3;

use pv_core::{ContentId, VaultResult};

pub use memory::{FlakyStore, MemoryStore};
pub use retry::fetch_with_backoff;
pub use s3::{build_s3_store, S3Config, S3Store};

/// Content-addressed, immutable blob store.
///
/// `put` derives the address from the blob's BLAKE3 hash; `get` failures
/// are transient (`VaultError::Store`) and eligible for retry with
/// backoff — distinct from any cryptographic failure.
pub trait ContentStore: Send + Sync {
    fn put(&self, blob: &[u8]) -> impl std::future::Future<Output = VaultResult<ContentId>> + Send;
    fn get(&self, id: &ContentId) -> impl std::future::Future<Output = VaultResult<Vec<u8>>> + Send;
}

/// Derive the content address for a blob.
pub fn content_id_for(blob: &[u8]) -> ContentId {
    ContentId(hex::encode(blake3::hash(blob).as_bytes()))
}
