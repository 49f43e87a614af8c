//! pv-escrow: the key-escrow and disclosure protocol.
//!
//! A teacher uploads an encrypted paper; an authority schedules its
//! unlock time and custodian set on the ledger; exam centers each hold
//! one sealed share of the master key. At (ledger) unlock time, any
//! threshold of custodians reconstructs the master key, unwraps the
//! content key, and decrypts the paper.
//!
//! The time gate is an authorization decision made by the ledger, not a
//! property of the ciphertext: this crate trusts the ledger's clock and
//! re-checks it immediately before every reconstruction attempt.

pub mod ledger;
pub mod orchestrator;
pub mod signer;

pub use ledger::{Ledger, MemoryLedger};
pub use orchestrator::{DisclosureOrchestrator, UploadReceipt};
pub use signer::{DeterministicSigner, Signer};
