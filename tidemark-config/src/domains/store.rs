//! Target store configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend holding the migrated collections and the changelog
    #[serde(default)]
    pub backend: StoreBackend,
}

/// Store backend type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreBackend {
    /// One JSON file per collection under `data_dir`
    File {
        #[serde(default = "default_data_dir")]
        data_dir: PathBuf,
    },

    /// Process-local store, discarded on exit (for testing)
    InMemory,
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::File {
            data_dir: default_data_dir(),
        }
    }
}

impl Validatable for StoreConfig {
    fn validate(&self) -> ConfigResult<()> {
        match &self.backend {
            StoreBackend::File { data_dir } if data_dir.as_os_str().is_empty() => {
                Err(self.validation_error("data_dir cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    fn domain_name(&self) -> &'static str {
        "store"
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".tidemark/data")
}
