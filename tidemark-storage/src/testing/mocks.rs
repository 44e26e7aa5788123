//! Mock implementations for testing
//!
//! Mocks of the storage traits built with the mockall framework.

use async_trait::async_trait;
use mockall::mock;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::{ChangelogEntry, ChangelogStore, Collection, Database, Document, StorageResult};

mock! {
    pub DatabaseHandle {}

    #[async_trait]
    impl Database for DatabaseHandle {
        fn collection(&self, name: &str) -> Arc<dyn Collection>;
        async fn collection_names(&self) -> StorageResult<Vec<String>>;
        async fn drop_collection(&self, name: &str) -> StorageResult<bool>;
    }
}

mock! {
    pub CollectionHandle {}

    #[async_trait]
    impl Collection for CollectionHandle {
        fn name(&self) -> &str;
        async fn find(&self, filter: &Document) -> StorageResult<Vec<Document>>;
        async fn find_all(&self) -> StorageResult<Vec<Document>>;
        async fn insert_one(&self, document: Document) -> StorageResult<()>;
        async fn update_many(&self, filter: &Document, fields: &Map<String, Value>) -> StorageResult<u64>;
        async fn delete_one(&self, filter: &Document) -> StorageResult<u64>;
        async fn delete_many(&self, filter: &Document) -> StorageResult<u64>;
    }
}

mock! {
    pub Changelog {}

    #[async_trait]
    impl ChangelogStore for Changelog {
        async fn find_all(&self) -> StorageResult<Vec<ChangelogEntry>>;
        async fn insert_one(&self, entry: &ChangelogEntry) -> StorageResult<()>;
        async fn delete_one(&self, file_name: &str) -> StorageResult<u64>;
    }
}
