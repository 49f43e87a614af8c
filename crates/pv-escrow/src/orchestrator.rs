//! The disclosure state machine.
//!
//! `Uploaded → Scheduled → Unlockable → Unlocked → Disclosed`, where every
//! transition after `Scheduled` is gated by authorization facts read from
//! the ledger. This module only sequences the cryptographic primitives;
//! it fails closed on any missing precondition and advances no state on
//! failure.

use tracing::{debug, info, warn};

use pv_core::config::VaultConfig;
use pv_core::{
    ChunkRef, CustodianId, DisclosureState, DocumentId, UnlockRecord, VaultError, VaultResult,
};
use pv_crypto::wire::{self, Kind};
use pv_crypto::{
    combine_shares, decrypt_chunk, derive_keypair, digest_from_id, document_digest, encrypt_chunk,
    generate_content_key, generate_master_key, open_for_identity, reassemble, seal_for_identity,
    split_document, split_master_key, unwrap_key, wrap_key, ContentKey, KeyShare, PublicKey,
};
use pv_store::{fetch_with_backoff, ContentStore};

use crate::ledger::Ledger;

/// Result of uploading a document: its identity, chunk addresses, and the
/// content key, which lives only here until `schedule` consumes it.
pub struct UploadReceipt {
    pub document_id: DocumentId,
    pub chunks: Vec<ChunkRef>,
    content_key: ContentKey,
}

impl std::fmt::Debug for UploadReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadReceipt")
            .field("document_id", &self.document_id)
            .field("chunks", &self.chunks.len())
            .field("content_key", &"[REDACTED]")
            .finish()
    }
}

pub struct DisclosureOrchestrator<L, S> {
    ledger: L,
    store: S,
    config: VaultConfig,
}

impl<L: Ledger, S: ContentStore> DisclosureOrchestrator<L, S> {
    pub fn new(ledger: L, store: S, config: VaultConfig) -> Self {
        Self {
            ledger,
            store,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Encrypt and upload a document under a fresh content key.
    ///
    /// Chunks are independent ciphertexts (AAD binds index and document),
    /// so a later partial fetch failure never poisons its neighbours.
    /// The plaintext content key exists only in the returned receipt.
    pub async fn upload(&self, document: &[u8]) -> VaultResult<UploadReceipt> {
        let digest = document_digest(document);
        let document_id = DocumentId(hex::encode(digest));
        let content_key = generate_content_key();

        let plaintext_chunks = split_document(document, self.config.chunking.chunk_size)?;
        let mut chunks = Vec::with_capacity(plaintext_chunks.len());
        for (index, chunk) in plaintext_chunks.into_iter().enumerate() {
            let index = index as u64;
            let encrypted = encrypt_chunk(&content_key, index, &digest, chunk)?;
            let content_id = self.store.put(&encrypted).await?;
            debug!(%document_id, index, %content_id, "chunk uploaded");
            chunks.push(ChunkRef { index, content_id });
        }

        info!(%document_id, chunks = chunks.len(), "document uploaded");
        Ok(UploadReceipt {
            document_id,
            chunks,
            content_key,
        })
    }

    /// Place a document under threshold custody and register the unlock
    /// schedule on the ledger.
    ///
    /// Generates the master key, wraps the content key under it, splits
    /// it into one share per custodian, and seals each share to that
    /// custodian's identity public key. Both keys are dropped before this
    /// returns; only wrapped/sealed material leaves the process.
    pub async fn schedule(
        &self,
        receipt: UploadReceipt,
        unlock_time: u64,
        custodians: &[(CustodianId, PublicKey)],
    ) -> VaultResult<()> {
        let threshold = self.config.shares.threshold;
        if custodians.is_empty() || custodians.len() > u8::MAX as usize {
            return Err(VaultError::MalformedInput(format!(
                "custodian count {} out of range",
                custodians.len()
            )));
        }
        if custodians.len() < threshold as usize {
            return Err(VaultError::MalformedInput(format!(
                "{} custodians cannot meet threshold {threshold}",
                custodians.len()
            )));
        }

        let now = self.ledger.current_time().await?;
        if unlock_time <= now {
            return Err(VaultError::MalformedInput(format!(
                "unlock time {unlock_time} is not in the future (ledger time {now})"
            )));
        }

        let master_key = generate_master_key();
        let wrapped = wire::encode(Kind::WrappedKey, &wrap_key(&master_key, &receipt.content_key)?)?;

        let shares = split_master_key(&master_key, custodians.len() as u8, threshold)?;
        let mut sealed_shares = std::collections::BTreeMap::new();
        for (share, (custodian, public_key)) in shares.iter().zip(custodians) {
            let framed_share = wire::encode(Kind::Share, &share.to_bytes())?;
            let sealed = seal_for_identity(&framed_share, public_key)?;
            sealed_shares.insert(custodian.clone(), wire::encode(Kind::Sealed, &sealed)?);
        }

        let record = UnlockRecord {
            document_id: receipt.document_id.clone(),
            unlock_time,
            threshold,
            custodians: custodians.iter().map(|(id, _)| id.clone()).collect(),
            wrapped_key: wrapped,
            sealed_shares,
            unlocked_by: Vec::new(),
            chunks: receipt.chunks.clone(),
        };

        self.ledger.schedule(record).await?;
        info!(document_id = %receipt.document_id, unlock_time, threshold,
              custodians = custodians.len(), "document scheduled");
        // receipt (and with it the content key) drops here
        Ok(())
    }

    /// Current lifecycle state of a document, as the ledger sees it.
    ///
    /// Reports at most [`DisclosureState::Unlocked`]: disclosure itself
    /// is local to whoever called [`disclose`](Self::disclose) and
    /// leaves no ledger trace, so `Disclosed` is represented by that
    /// call returning the plaintext, not by a record field.
    pub async fn state(&self, document_id: &DocumentId) -> VaultResult<DisclosureState> {
        let Some(record) = self.ledger.get_unlock_record(document_id).await? else {
            return Ok(DisclosureState::Uploaded);
        };
        if record.unlocked_by.len() >= record.threshold as usize {
            return Ok(DisclosureState::Unlocked);
        }
        let now = self.ledger.current_time().await?;
        if now >= record.unlock_time {
            Ok(DisclosureState::Unlockable)
        } else {
            Ok(DisclosureState::Scheduled)
        }
    }

    /// A custodian's unlock action: open their sealed share and record
    /// the action on the ledger.
    ///
    /// The authorization predicate is re-read from the ledger here and
    /// refused even if the sealed share is already present locally. The
    /// derived keypair lives only for the duration of this call.
    pub async fn submit_unlock(
        &self,
        document_id: &DocumentId,
        custodian: &CustodianId,
        signature: &str,
    ) -> VaultResult<KeyShare> {
        let record = self.require_record(document_id).await?;
        self.require_unlockable(&record).await?;

        if !record.custodians.contains(custodian) {
            return Err(VaultError::Ledger(format!(
                "{custodian} is not a custodian of {document_id}"
            )));
        }
        let framed = record.sealed_shares.get(custodian).ok_or_else(|| {
            VaultError::MalformedKeyMaterial(format!("no sealed share for {custodian}"))
        })?;

        let keypair = derive_keypair(signature)?;
        let sealed = wire::decode(Kind::Sealed, framed)?;
        let framed_share = open_for_identity(sealed, &keypair)?;
        let share = KeyShare::from_bytes(wire::decode(Kind::Share, &framed_share)?)?;

        self.ledger.record_unlock(document_id, custodian).await?;
        info!(%document_id, %custodian, "custodian unlock recorded");
        Ok(share)
    }

    /// Reconstruct the master key from custodian shares and decrypt the
    /// document.
    ///
    /// Authorization is re-read from the ledger immediately before
    /// reconstruction — a cached earlier read must never gate this. The
    /// interpolated master key is only trusted once it unwraps the
    /// wrapped content key; an unwrap failure there means the shares
    /// were corrupted or forged (`ReconstructionMismatch`), never a
    /// plausible wrong key.
    pub async fn disclose(
        &self,
        document_id: &DocumentId,
        shares: &[KeyShare],
    ) -> VaultResult<Vec<u8>> {
        let record = self.require_record(document_id).await?;
        self.require_unlockable(&record).await?;

        let candidate = combine_shares(shares, record.threshold)?;

        let wrapped = wire::decode(Kind::WrappedKey, &record.wrapped_key)?;
        let content_key = unwrap_key(&candidate, wrapped).map_err(|e| match e {
            VaultError::AuthenticationFailure => VaultError::ReconstructionMismatch,
            other => other,
        })?;

        let digest = digest_from_id(document_id)?;
        let mut decrypted = Vec::with_capacity(record.chunks.len());
        for chunk_ref in &record.chunks {
            let blob = fetch_with_backoff(&self.store, &chunk_ref.content_id, &self.config.fetch)
                .await?;
            let plaintext = decrypt_chunk(&content_key, chunk_ref.index, &digest, &blob)?;
            decrypted.push((chunk_ref.index, plaintext));
        }

        let document = reassemble(decrypted)?;
        if document_digest(&document) != digest {
            warn!(%document_id, "reassembled document does not match its digest");
            return Err(VaultError::AuthenticationFailure);
        }

        info!(%document_id, bytes = document.len(), "document disclosed");
        Ok(document)
    }

    async fn require_record(&self, document_id: &DocumentId) -> VaultResult<UnlockRecord> {
        self.ledger
            .get_unlock_record(document_id)
            .await?
            .ok_or_else(|| VaultError::Ledger(format!("no unlock record for {document_id}")))
    }

    async fn require_unlockable(&self, record: &UnlockRecord) -> VaultResult<()> {
        let now = self.ledger.current_time().await?;
        if now < record.unlock_time {
            warn!(document_id = %record.document_id, unlock_time = record.unlock_time, now,
                  "disclosure refused: unlock time not reached");
            return Err(VaultError::UnauthorizedDisclosure {
                unlock_time: record.unlock_time,
                now,
            });
        }
        Ok(())
    }
}
