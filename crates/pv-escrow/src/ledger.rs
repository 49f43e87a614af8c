//! Ledger interface: the external source of authorization facts.
//!
//! The ledger owns schedules, custodian sets, wrapped key material, and
//! the clock that gates disclosure. This crate only reads those facts
//! (and records custodian actions); it never decides *when* a document
//! becomes unlockable. All key material returned by a ledger is
//! untrusted bytes until it passes wire-frame validation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use pv_core::{CustodianId, DocumentId, UnlockRecord, VaultError, VaultResult};

pub trait Ledger: Send + Sync {
    fn get_unlock_record(
        &self,
        document_id: &DocumentId,
    ) -> impl std::future::Future<Output = VaultResult<Option<UnlockRecord>>> + Send;

    fn schedule(
        &self,
        record: UnlockRecord,
    ) -> impl std::future::Future<Output = VaultResult<()>> + Send;

    fn record_unlock(
        &self,
        document_id: &DocumentId,
        custodian: &CustodianId,
    ) -> impl std::future::Future<Output = VaultResult<()>> + Send;

    /// The ledger's current time in unix seconds. This is the only
    /// authorization clock; the local clock is never consulted.
    fn current_time(&self) -> impl std::future::Future<Output = VaultResult<u64>> + Send;
}

/// In-memory ledger double with a settable clock.
pub struct MemoryLedger {
    records: Mutex<HashMap<DocumentId, UnlockRecord>>,
    now: AtomicU64,
}

impl MemoryLedger {
    pub fn new(now: u64) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            now: AtomicU64::new(now),
        }
    }

    pub fn set_time(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Ledger for MemoryLedger {
    async fn get_unlock_record(&self, document_id: &DocumentId) -> VaultResult<Option<UnlockRecord>> {
        Ok(self.records.lock().await.get(document_id).cloned())
    }

    async fn schedule(&self, record: UnlockRecord) -> VaultResult<()> {
        let mut records = self.records.lock().await;
        if records.contains_key(&record.document_id) {
            return Err(VaultError::Ledger(format!(
                "document {} is already scheduled",
                record.document_id
            )));
        }
        records.insert(record.document_id.clone(), record);
        Ok(())
    }

    async fn record_unlock(
        &self,
        document_id: &DocumentId,
        custodian: &CustodianId,
    ) -> VaultResult<()> {
        let mut records = self.records.lock().await;
        let record = records.get_mut(document_id).ok_or_else(|| {
            VaultError::Ledger(format!("no unlock record for document {document_id}"))
        })?;
        if !record.custodians.contains(custodian) {
            return Err(VaultError::Ledger(format!(
                "{custodian} is not a custodian of {document_id}"
            )));
        }
        if !record.unlocked_by.contains(custodian) {
            record.unlocked_by.push(custodian.clone());
        }
        Ok(())
    }

    async fn current_time(&self) -> VaultResult<u64> {
        Ok(self.now.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(document_id: &str, custodian: &str) -> UnlockRecord {
        UnlockRecord {
            document_id: DocumentId(document_id.into()),
            unlock_time: 1000,
            threshold: 2,
            custodians: vec![CustodianId(custodian.into())],
            wrapped_key: vec![],
            sealed_shares: Default::default(),
            unlocked_by: vec![],
            chunks: vec![],
        }
    }

    #[tokio::test]
    async fn schedule_then_read_back() {
        let ledger = MemoryLedger::new(0);
        ledger.schedule(record("doc", "0xaa")).await.unwrap();

        let found = ledger
            .get_unlock_record(&DocumentId("doc".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.unlock_time, 1000);
    }

    #[tokio::test]
    async fn double_schedule_rejected() {
        let ledger = MemoryLedger::new(0);
        ledger.schedule(record("doc", "0xaa")).await.unwrap();
        assert!(ledger.schedule(record("doc", "0xaa")).await.is_err());
    }

    #[tokio::test]
    async fn record_unlock_is_idempotent_per_custodian() {
        let ledger = MemoryLedger::new(0);
        ledger.schedule(record("doc", "0xaa")).await.unwrap();

        let doc = DocumentId("doc".into());
        let custodian = CustodianId("0xaa".into());
        ledger.record_unlock(&doc, &custodian).await.unwrap();
        ledger.record_unlock(&doc, &custodian).await.unwrap();

        let found = ledger.get_unlock_record(&doc).await.unwrap().unwrap();
        assert_eq!(found.unlocked_by.len(), 1);
    }

    #[tokio::test]
    async fn unknown_custodian_rejected() {
        let ledger = MemoryLedger::new(0);
        ledger.schedule(record("doc", "0xaa")).await.unwrap();

        let err = ledger
            .record_unlock(&DocumentId("doc".into()), &CustodianId("0xbb".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Ledger(_)));
    }

    #[tokio::test]
    async fn clock_is_settable() {
        let ledger = MemoryLedger::new(100);
        assert_eq!(ledger.current_time().await.unwrap(), 100);
        ledger.advance(50);
        assert_eq!(ledger.current_time().await.unwrap(), 150);
    }
}
