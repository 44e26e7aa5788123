//! File-backed database: one JSON array per collection
//!
//! Each collection lives in `<root>/<name>.json`. Writes go to a sibling
//! temporary file that is renamed over the current one, so a crash never leaves
//! a half-written collection behind. Writers within one process are
//! serialised; there is no cross-process locking.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::database::{
    ensure_filter, ensure_object, matches_filter, remove_all_matching, remove_first_matching,
    update_matching, validate_collection_name, Collection, Database, Document,
};
use crate::{StorageError, StorageResult};

const COLLECTION_EXTENSION: &str = "json";

/// Database persisted as JSON files in a directory
#[derive(Clone)]
pub struct FileDatabase {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileDatabase {
    /// Open (creating if needed) a database rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::debug!("Opened file database at {}", root.display());
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Directory holding the collection files
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Database for FileDatabase {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        Arc::new(FileCollection {
            name: name.to_string(),
            root: self.root.clone(),
            write_lock: self.write_lock.clone(),
        })
    }

    async fn collection_names(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(COLLECTION_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> StorageResult<bool> {
        validate_collection_name(name)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(collection_path(&self.root, name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Collection handle into a [`FileDatabase`]
pub struct FileCollection {
    name: String,
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileCollection {
    fn path(&self) -> StorageResult<PathBuf> {
        validate_collection_name(&self.name)?;
        Ok(collection_path(&self.root, &self.name))
    }

    async fn read(&self) -> StorageResult<Vec<Document>> {
        let path = self.path()?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::InvalidDocument(format!("{} is not a JSON array: {}", path.display(), e))
        })
    }

    async fn write(&self, documents: &[Document]) -> StorageResult<()> {
        let path = self.path()?;
        let tmp = path.with_extension(format!("{}.tmp", COLLECTION_EXTENSION));
        let bytes = serde_json::to_vec_pretty(documents)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read-modify-write under the database write lock
    async fn modify<F>(&self, apply: F) -> StorageResult<u64>
    where
        F: FnOnce(&mut Vec<Document>) -> u64 + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.read().await?;
        let changed = apply(&mut documents);
        if changed > 0 {
            self.write(&documents).await?;
        }
        Ok(changed)
    }
}

#[async_trait]
impl Collection for FileCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Document) -> StorageResult<Vec<Document>> {
        ensure_filter(filter)?;
        let documents = self.read().await?;
        Ok(documents.into_iter().filter(|d| matches_filter(d, filter)).collect())
    }

    async fn find_all(&self) -> StorageResult<Vec<Document>> {
        self.read().await
    }

    async fn insert_one(&self, document: Document) -> StorageResult<()> {
        ensure_object(&document)?;
        self.modify(move |docs| {
            docs.push(document);
            1
        })
        .await?;
        Ok(())
    }

    async fn update_many(&self, filter: &Document, fields: &Map<String, Value>) -> StorageResult<u64> {
        ensure_filter(filter)?;
        self.modify(|docs| update_matching(docs, filter, fields)).await
    }

    async fn delete_one(&self, filter: &Document) -> StorageResult<u64> {
        ensure_filter(filter)?;
        self.modify(|docs| remove_first_matching(docs, filter)).await
    }

    async fn delete_many(&self, filter: &Document) -> StorageResult<u64> {
        ensure_filter(filter)?;
        self.modify(|docs| remove_all_matching(docs, filter)).await
    }
}

fn collection_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}.{}", name, COLLECTION_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let db = FileDatabase::open(dir.path()).await.unwrap();
        db.collection("users").insert_one(json!({"name": "ada"})).await.unwrap();
        db.collection("users").insert_one(json!({"name": "grace"})).await.unwrap();

        let reopened = FileDatabase::open(dir.path()).await.unwrap();
        let users = reopened.collection("users").find_all().await.unwrap();
        assert_eq!(users, vec![json!({"name": "ada"}), json!({"name": "grace"})]);
        assert_eq!(reopened.collection_names().await.unwrap(), vec!["users".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_collection_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = FileDatabase::open(dir.path().join("nested")).await.unwrap();

        assert!(db.collection("nothing").find_all().await.unwrap().is_empty());
        assert_eq!(db.collection("nothing").delete_one(&json!({})).await.unwrap(), 0);
        assert!(!db.drop_collection("nothing").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_and_delete_many() {
        let dir = tempfile::tempdir().unwrap();
        let db = FileDatabase::open(dir.path()).await.unwrap();
        let items = db.collection("items");

        for n in 0..4 {
            items.insert_one(json!({"n": n, "even": n % 2 == 0})).await.unwrap();
        }

        let mut fields = Map::new();
        fields.insert("tag".to_string(), json!("x"));
        assert_eq!(items.update_many(&json!({"even": true}), &fields).await.unwrap(), 2);
        assert_eq!(items.find(&json!({"tag": "x"})).await.unwrap().len(), 2);

        assert_eq!(items.delete_many(&json!({"even": false})).await.unwrap(), 2);
        assert_eq!(items.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_collection_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("broken.json"), b"{not json").await.unwrap();

        let db = FileDatabase::open(dir.path()).await.unwrap();
        let err = db.collection("broken").find_all().await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn test_rejects_path_like_collection_names() {
        let dir = tempfile::tempdir().unwrap();
        let db = FileDatabase::open(dir.path()).await.unwrap();

        let err = db.collection("../escape").insert_one(json!({})).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidCollection(_)));
    }
}
