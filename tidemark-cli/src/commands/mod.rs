//! Command handlers

pub mod changelog;
pub mod config;
pub mod migrate;

use anyhow::{Context, Result};
use std::sync::Arc;
use tidemark_config::{StoreBackend, TidemarkConfig};
use tidemark_migrate::{DirectorySource, Migrator};
use tidemark_storage::{Database, FileDatabase, InMemoryDatabase};
use tracing::{debug, warn};

/// Everything a migration command needs: the store and a migrator for it
pub struct Workspace {
    pub db: Arc<dyn Database>,
    pub source: Arc<DirectorySource>,
    pub migrator: Migrator,
}

impl Workspace {
    pub async fn open(config: &TidemarkConfig) -> Result<Self> {
        let db = open_store(&config.store.backend).await?;
        let source = Arc::new(DirectorySource::from_config(&config.migrations));
        let migrator = Migrator::from_config(source.clone(), &config.migrations);

        debug!(
            migrations_dir = %source.dir().display(),
            changelog = %migrator.changelog_collection(),
            "Workspace ready"
        );

        Ok(Self {
            db,
            source,
            migrator,
        })
    }
}

async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn Database>> {
    match backend {
        StoreBackend::File { data_dir } => {
            let db = FileDatabase::open(data_dir)
                .await
                .with_context(|| format!("Failed to open store at {}", data_dir.display()))?;
            Ok(Arc::new(db))
        }
        StoreBackend::InMemory => {
            warn!("Using the in-memory store; nothing will be persisted");
            Ok(Arc::new(InMemoryDatabase::new()))
        }
    }
}
