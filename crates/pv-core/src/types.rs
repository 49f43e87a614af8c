use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a sealed document: hex BLAKE3 digest of the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content-store address of one encrypted chunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId(pub String);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// External identity of a custodian (e.g. a wallet address).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CustodianId(pub String);

impl fmt::Display for CustodianId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant role. Each role signs a role-specific challenge to derive
/// its identity keypair, so keys never cross role boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Uploads and encrypts the paper.
    Teacher,
    /// Schedules the unlock time and custodian set.
    Authority,
    /// Holds one key share; participates in disclosure.
    ExamCenter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Authority => "authority",
            Role::ExamCenter => "exam-center",
        }
    }

    /// Canonical key-derivation challenge for this (identity, role) pair.
    ///
    /// The external signer signs exactly this string; the resulting
    /// signature is the sole input to identity keypair derivation, so the
    /// wording is part of the protocol and must never change within a
    /// version.
    pub fn challenge(&self, identity: &CustodianId) -> String {
        format!(
            "papervault identity key v1\nrole: {}\naddress: {}",
            self.as_str(),
            identity
        )
    }
}

/// A (chunk index, content address) pair; indices reassemble in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    pub index: u64,
    pub content_id: ContentId,
}

/// Disclosure lifecycle of a document.
///
/// Transitions only move forward. `Scheduled -> Unlockable` is observed
/// (ledger time passing the unlock time), never caused by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisclosureState {
    Uploaded,
    Scheduled,
    Unlockable,
    Unlocked,
    /// Terminal state: the document was reconstructed and returned to
    /// the caller. Disclosure is a local act the ledger cannot observe,
    /// so ledger-derived state reporting tops out at `Unlocked`; this
    /// variant is reached exactly when a disclose call returns the
    /// plaintext.
    Disclosed,
}

/// The ledger's record for one scheduled document.
///
/// Owned and mutated by the external ledger; this crate only reads it.
/// Every key-material field holds untrusted, wire-framed bytes that must
/// pass frame validation before reaching a cryptographic primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRecord {
    pub document_id: DocumentId,
    /// Unix seconds, ledger clock.
    pub unlock_time: u64,
    /// Minimum number of custodians required for reconstruction.
    pub threshold: u8,
    pub custodians: Vec<CustodianId>,
    /// Wire-framed wrapped content key (K1 under K2).
    pub wrapped_key: Vec<u8>,
    /// Wire-framed sealed share per custodian.
    pub sealed_shares: BTreeMap<CustodianId, Vec<u8>>,
    /// Custodians whose unlock action the ledger has recorded.
    pub unlocked_by: Vec<CustodianId>,
    pub chunks: Vec<ChunkRef>,
}
