//! Persistent audit trail of agent requests and responses.

mod sqlite_store;
mod types;

pub use sqlite_store::SqliteRecordStore;
pub use types::*;
