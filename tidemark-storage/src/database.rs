//! Database and collection abstractions

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::{StorageError, StorageResult};

/// A stored document. Always a JSON object.
pub type Document = Value;

/// A named collection of documents (object-safe)
///
/// Filters are JSON objects matched by equality on top-level fields; an empty
/// object matches every document.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Fetch all documents matching `filter`, in insertion order
    async fn find(&self, filter: &Document) -> StorageResult<Vec<Document>>;

    /// Fetch every document
    async fn find_all(&self) -> StorageResult<Vec<Document>>;

    /// Append a document
    async fn insert_one(&self, document: Document) -> StorageResult<()>;

    /// Set `fields` on every document matching `filter`, returning how many matched
    async fn update_many(&self, filter: &Document, fields: &Map<String, Value>) -> StorageResult<u64>;

    /// Remove the first document matching `filter`, returning 0 or 1
    async fn delete_one(&self, filter: &Document) -> StorageResult<u64>;

    /// Remove every document matching `filter`
    async fn delete_many(&self, filter: &Document) -> StorageResult<u64>;
}

/// Handle to a store holding named collections
#[async_trait]
pub trait Database: Send + Sync {
    /// Get a handle to a collection; it is created lazily on first write
    fn collection(&self, name: &str) -> Arc<dyn Collection>;

    /// Names of collections that currently hold data, sorted
    async fn collection_names(&self) -> StorageResult<Vec<String>>;

    /// Drop a collection, returning whether it existed
    async fn drop_collection(&self, name: &str) -> StorageResult<bool>;
}

/// Check whether `document` satisfies `filter`
pub fn matches_filter(document: &Document, filter: &Document) -> bool {
    match filter {
        Value::Null => true,
        Value::Object(criteria) => criteria
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected)),
        _ => false,
    }
}

pub(crate) fn ensure_object(document: &Document) -> StorageResult<()> {
    if document.is_object() {
        Ok(())
    } else {
        Err(StorageError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            document
        )))
    }
}

pub(crate) fn ensure_filter(filter: &Document) -> StorageResult<()> {
    match filter {
        Value::Null | Value::Object(_) => Ok(()),
        other => Err(StorageError::InvalidDocument(format!(
            "filter must be a JSON object, got {}",
            other
        ))),
    }
}

pub(crate) fn validate_collection_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '$']) {
        return Err(StorageError::InvalidCollection(name.to_string()));
    }
    Ok(())
}

pub(crate) fn update_matching(
    documents: &mut [Document],
    filter: &Document,
    fields: &Map<String, Value>,
) -> u64 {
    let mut updated = 0;
    for document in documents.iter_mut().filter(|d| matches_filter(d, filter)) {
        if let Some(object) = document.as_object_mut() {
            for (key, value) in fields {
                object.insert(key.clone(), value.clone());
            }
        }
        updated += 1;
    }
    updated
}

pub(crate) fn remove_first_matching(documents: &mut Vec<Document>, filter: &Document) -> u64 {
    match documents.iter().position(|d| matches_filter(d, filter)) {
        Some(index) => {
            documents.remove(index);
            1
        }
        None => 0,
    }
}

pub(crate) fn remove_all_matching(documents: &mut Vec<Document>, filter: &Document) -> u64 {
    let before = documents.len();
    documents.retain(|d| !matches_filter(d, filter));
    (before - documents.len()) as u64
}
