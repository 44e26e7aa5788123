//! Document store abstraction for Tidemark
//!
//! Migrations run against a [`Database`] of named JSON document collections.
//! The changelog recording applied migrations lives in one of those
//! collections and is accessed through [`ChangelogStore`].

pub mod changelog;
pub mod database;
pub mod error;
pub mod file;
pub mod memory;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export core types for convenience
pub use changelog::{ChangelogEntry, ChangelogStore, CollectionChangelog};
pub use database::{Collection, Database, Document};
pub use error::{StorageError, StorageResult};
pub use file::FileDatabase;
pub use memory::InMemoryDatabase;
