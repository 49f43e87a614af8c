//! OpenDAL-backed S3 adapter for the chunk store.
//!
//! Chunks live under `chunks/<blake3-hex>`. Path-style addressing is the
//! opendal default and is required by SeaweedFS and MinIO.

use opendal::Operator;
use tracing::debug;

use pv_core::{ContentId, VaultError, VaultResult};

use crate::{content_id_for, ContentStore};

/// Minimal config needed to build the S3 operator.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Content store backed by any S3-compatible endpoint.
pub struct S3Store {
    op: Operator,
}

/// Build an [`S3Store`] with logging and retry layers.
pub fn build_s3_store(cfg: &S3Config) -> VaultResult<S3Store> {
    let builder = opendal::services::S3::default()
        .endpoint(&cfg.endpoint)
        .region(&cfg.region)
        .bucket(&cfg.bucket)
        .access_key_id(&cfg.access_key_id)
        .secret_access_key(&cfg.secret_access_key);

    let op = Operator::new(builder)
        .map_err(|e| VaultError::Store(format!("creating S3 operator: {e}")))?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
        .finish();

    Ok(S3Store { op })
}

fn chunk_path(id: &ContentId) -> String {
    format!("chunks/{id}")
}

impl ContentStore for S3Store {
    async fn put(&self, blob: &[u8]) -> VaultResult<ContentId> {
        let id = content_id_for(blob);
        let path = chunk_path(&id);
        debug!(content_id = %id, bytes = blob.len(), "uploading chunk");
        self.op
            .write(&path, blob.to_vec())
            .await
            .map_err(|e| VaultError::Store(format!("put {path}: {e}")))?;
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> VaultResult<Vec<u8>> {
        let path = chunk_path(id);
        let buffer = self
            .op
            .read(&path)
            .await
            .map_err(|e| VaultError::Store(format!("get {path}: {e}")))?;
        Ok(buffer.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_store_with_valid_config() {
        let cfg = S3Config {
            endpoint: "http://localhost:8333".to_string(),
            region: "us-east-1".to_string(),
            bucket: "papers".to_string(),
            access_key_id: "test-key".to_string(),
            secret_access_key: "test-secret".to_string(),
        };
        assert!(build_s3_store(&cfg).is_ok());
    }

    #[test]
    fn chunk_paths_are_namespaced() {
        let id = ContentId("abc123".into());
        assert_eq!(chunk_path(&id), "chunks/abc123");
    }
}
