//! Process-local database, mainly for tests and dry runs

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::database::{
    ensure_filter, ensure_object, matches_filter, remove_all_matching, remove_first_matching,
    update_matching, validate_collection_name, Collection, Database, Document,
};
use crate::StorageResult;

type Collections = Arc<RwLock<HashMap<String, Vec<Document>>>>;

/// In-memory database; clones share the same data
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    collections: Collections,
}

impl InMemoryDatabase {
    /// Create an empty in-memory database
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        Arc::new(InMemoryCollection {
            name: name.to_string(),
            collections: self.collections.clone(),
        })
    }

    async fn collection_names(&self) -> StorageResult<Vec<String>> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> StorageResult<bool> {
        validate_collection_name(name)?;
        Ok(self.collections.write().await.remove(name).is_some())
    }
}

/// Collection handle into an [`InMemoryDatabase`]
pub struct InMemoryCollection {
    name: String,
    collections: Collections,
}

#[async_trait]
impl Collection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Document) -> StorageResult<Vec<Document>> {
        validate_collection_name(&self.name)?;
        ensure_filter(filter)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&self.name)
            .map(|docs| docs.iter().filter(|d| matches_filter(d, filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_all(&self) -> StorageResult<Vec<Document>> {
        self.find(&Value::Object(Map::new())).await
    }

    async fn insert_one(&self, document: Document) -> StorageResult<()> {
        validate_collection_name(&self.name)?;
        ensure_object(&document)?;
        let mut collections = self.collections.write().await;
        collections.entry(self.name.clone()).or_default().push(document);
        Ok(())
    }

    async fn update_many(&self, filter: &Document, fields: &Map<String, Value>) -> StorageResult<u64> {
        validate_collection_name(&self.name)?;
        ensure_filter(filter)?;
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&self.name)
            .map(|docs| update_matching(docs, filter, fields))
            .unwrap_or(0))
    }

    async fn delete_one(&self, filter: &Document) -> StorageResult<u64> {
        validate_collection_name(&self.name)?;
        ensure_filter(filter)?;
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&self.name)
            .map(|docs| remove_first_matching(docs, filter))
            .unwrap_or(0))
    }

    async fn delete_many(&self, filter: &Document) -> StorageResult<u64> {
        validate_collection_name(&self.name)?;
        ensure_filter(filter)?;
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&self.name)
            .map(|docs| remove_all_matching(docs, filter))
            .unwrap_or(0))
    }
}
