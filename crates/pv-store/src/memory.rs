//! In-memory store doubles for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::RwLock;

use pv_core::{ContentId, VaultError, VaultResult};

use crate::{content_id_for, ContentStore};

/// In-memory content-addressed store.
#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<ContentId, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentStore for MemoryStore {
    async fn put(&self, blob: &[u8]) -> VaultResult<ContentId> {
        let id = content_id_for(blob);
        self.blobs.write().await.insert(id.clone(), blob.to_vec());
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> VaultResult<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| VaultError::Store(format!("blob not found: {id}")))
    }
}

/// Store double that fails the first `failures` fetches of each run with
/// a transient error, then behaves normally. Exercises retry/backoff.
pub struct FlakyStore {
    inner: MemoryStore,
    remaining_failures: AtomicU32,
}

impl FlakyStore {
    pub fn new(failures: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            remaining_failures: AtomicU32::new(failures),
        }
    }
}

impl ContentStore for FlakyStore {
    async fn put(&self, blob: &[u8]) -> VaultResult<ContentId> {
        self.inner.put(blob).await
    }

    async fn get(&self, id: &ContentId) -> VaultResult<Vec<u8>> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(VaultError::Store("injected transient failure".into()));
        }
        self.inner.get(id).await
    }
}
