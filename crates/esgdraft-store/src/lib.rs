//! SQLite persistence for drafts, input snapshots and the guidance corpus.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
