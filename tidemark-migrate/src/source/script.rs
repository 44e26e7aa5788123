//! Declarative migrations read from YAML or JSON files

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tidemark_storage::{Database, StorageResult};

use crate::{Migration, MigrationFailure};

/// A migration described as lists of collection operations
///
/// ```yaml
/// description: seed default roles
/// up:
///   - op: insert_many
///     collection: roles
///     documents: [{ name: admin }, { name: viewer }]
/// down:
///   - op: delete_many
///     collection: roles
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedMigration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub up: Vec<Step>,

    #[serde(default)]
    pub down: Vec<Step>,
}

/// One collection operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    InsertOne {
        collection: String,
        document: Value,
    },
    InsertMany {
        collection: String,
        documents: Vec<Value>,
    },
    UpdateMany {
        collection: String,
        #[serde(default)]
        filter: Value,
        set: Map<String, Value>,
    },
    DeleteMany {
        collection: String,
        #[serde(default)]
        filter: Value,
    },
    DropCollection {
        collection: String,
    },
}

impl Step {
    /// Run this step against `db`
    pub async fn apply(&self, db: &dyn Database) -> StorageResult<()> {
        match self {
            Step::InsertOne { collection, document } => {
                db.collection(collection).insert_one(document.clone()).await
            }
            Step::InsertMany { collection, documents } => {
                let target = db.collection(collection);
                for document in documents {
                    target.insert_one(document.clone()).await?;
                }
                Ok(())
            }
            Step::UpdateMany { collection, filter, set } => {
                let updated = db.collection(collection).update_many(filter, set).await?;
                tracing::debug!(collection = %collection, updated, "update_many");
                Ok(())
            }
            Step::DeleteMany { collection, filter } => {
                let deleted = db.collection(collection).delete_many(filter).await?;
                tracing::debug!(collection = %collection, deleted, "delete_many");
                Ok(())
            }
            Step::DropCollection { collection } => {
                db.drop_collection(collection).await?;
                Ok(())
            }
        }
    }
}

async fn apply_all(steps: &[Step], db: &dyn Database) -> Result<(), MigrationFailure> {
    for step in steps {
        step.apply(db).await?;
    }
    Ok(())
}

#[async_trait]
impl Migration for ScriptedMigration {
    async fn up(&self, db: Arc<dyn Database>) -> Result<(), MigrationFailure> {
        apply_all(&self.up, db.as_ref()).await
    }

    async fn down(&self, db: Arc<dyn Database>) -> Result<(), MigrationFailure> {
        apply_all(&self.down, db.as_ref()).await
    }
}
