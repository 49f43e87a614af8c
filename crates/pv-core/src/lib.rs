pub mod config;
pub mod error;
pub mod types;

pub use error::{VaultError, VaultResult};
pub use types::{
    ChunkRef, ContentId, CustodianId, DisclosureState, DocumentId, Role, UnlockRecord,
};
