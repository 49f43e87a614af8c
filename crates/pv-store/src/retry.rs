//! Bounded retry with exponential backoff for chunk fetches.

use std::time::Duration;

use tracing::warn;

use pv_core::config::FetchConfig;
use pv_core::{ContentId, VaultResult};

use crate::ContentStore;

/// Fetch a blob, retrying transient store failures with exponential
/// backoff.
///
/// Only `VaultError::Store` is retried; every other error — in
/// particular authentication and authorization failures — surfaces
/// immediately and untouched.
pub async fn fetch_with_backoff<S: ContentStore>(
    store: &S,
    id: &ContentId,
    fetch: &FetchConfig,
) -> VaultResult<Vec<u8>> {
    let mut backoff = Duration::from_millis(fetch.backoff_ms);

    for attempt in 0..=fetch.max_retries {
        match store.get(id).await {
            Ok(blob) => return Ok(blob),
            Err(e) if e.is_transient() && attempt < fetch.max_retries => {
                warn!(content_id = %id, attempt, error = %e, "chunk fetch failed, backing off");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => return Err(e),
        }
    }
    unreachable!("loop returns on final attempt");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FlakyStore, MemoryStore};

    fn fast_fetch(max_retries: u32) -> FetchConfig {
        FetchConfig {
            max_retries,
            backoff_ms: 1,
        }
    }

    #[tokio::test]
    async fn succeeds_within_retry_budget() {
        let store = FlakyStore::new(2);
        let id = store.put(b"chunk").await.unwrap();

        let blob = fetch_with_backoff(&store, &id, &fast_fetch(3)).await.unwrap();
        assert_eq!(blob, b"chunk");
    }

    #[tokio::test]
    async fn gives_up_after_budget_exhausted() {
        let store = FlakyStore::new(5);
        let id = store.put(b"chunk").await.unwrap();

        let err = fetch_with_backoff(&store, &id, &fast_fetch(2)).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn immediate_success_needs_no_retries() {
        let store = MemoryStore::new();
        let id = store.put(b"chunk").await.unwrap();

        let blob = fetch_with_backoff(&store, &id, &fast_fetch(0)).await.unwrap();
        assert_eq!(blob, b"chunk");
    }
}
