//! Domain-specific configuration modules

pub mod logging;
pub mod migrations;
pub mod store;

use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};

/// Main Tidemark configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TidemarkConfig {
    /// Migration discovery and changelog configuration
    #[serde(default)]
    pub migrations: migrations::MigrationsConfig,

    /// Target store configuration
    #[serde(default)]
    pub store: store::StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl TidemarkConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        crate::validation::validate_config(self)
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = TidemarkConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
