//! The changelog: which migrations are applied, and since when

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::database::{Collection, Database};
use crate::{StorageError, StorageResult};

/// A persisted changelog row
///
/// Stored as `{"fileName": ..., "appliedAt": ...}`. An entry exists exactly
/// while the store reflects the named migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogEntry {
    pub file_name: String,
    pub applied_at: DateTime<Utc>,
}

impl ChangelogEntry {
    /// Entry for a migration applied now
    pub fn applied_now(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            applied_at: Utc::now(),
        }
    }
}

/// Access to the changelog records
#[async_trait]
pub trait ChangelogStore: Send + Sync {
    /// All recorded entries, in storage order
    async fn find_all(&self) -> StorageResult<Vec<ChangelogEntry>>;

    /// Record a newly applied migration
    async fn insert_one(&self, entry: &ChangelogEntry) -> StorageResult<()>;

    /// Remove the entry for `file_name`, returning how many were removed
    async fn delete_one(&self, file_name: &str) -> StorageResult<u64>;
}

/// [`ChangelogStore`] backed by a document collection
pub struct CollectionChangelog {
    collection: Arc<dyn Collection>,
}

impl CollectionChangelog {
    pub fn new(collection: Arc<dyn Collection>) -> Self {
        Self { collection }
    }

    /// Changelog stored in the collection `name` of `db`
    pub fn open(db: &dyn Database, name: &str) -> Self {
        Self::new(db.collection(name))
    }

    /// Name of the backing collection
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

#[async_trait]
impl ChangelogStore for CollectionChangelog {
    async fn find_all(&self) -> StorageResult<Vec<ChangelogEntry>> {
        let documents = self.collection.find_all().await?;
        documents
            .into_iter()
            .map(|document| {
                serde_json::from_value(document).map_err(|e| {
                    StorageError::InvalidDocument(format!(
                        "malformed entry in changelog '{}': {}",
                        self.collection.name(),
                        e
                    ))
                })
            })
            .collect()
    }

    async fn insert_one(&self, entry: &ChangelogEntry) -> StorageResult<()> {
        self.collection.insert_one(serde_json::to_value(entry)?).await
    }

    async fn delete_one(&self, file_name: &str) -> StorageResult<u64> {
        self.collection.delete_one(&json!({ "fileName": file_name })).await
    }
}
