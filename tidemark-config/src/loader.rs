//! Configuration loading and environment variable handling

use crate::domains::store::StoreBackend;
use crate::domains::TidemarkConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "TIDEMARK".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML (or `.json`) file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<TidemarkConfig> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let mut config: TidemarkConfig = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<TidemarkConfig> {
        let mut config = TidemarkConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<TidemarkConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut TidemarkConfig) -> ConfigResult<()> {
        self.apply_migrations_overrides(&mut config.migrations)?;
        self.apply_store_overrides(&mut config.store)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_migrations_overrides(
        &self,
        config: &mut crate::domains::migrations::MigrationsConfig,
    ) -> ConfigResult<()> {
        if let Ok(dir) = self.get_env_var("MIGRATIONS_DIR") {
            config.migrations_dir = PathBuf::from(dir);
        }

        if let Ok(name) = self.get_env_var("CHANGELOG_COLLECTION") {
            config.changelog_collection_name = name;
        }

        if let Ok(extension) = self.get_env_var("MIGRATION_FILE_EXTENSION") {
            config.file_extension = extension;
        }

        if let Ok(policy) = self.get_env_var("IDENTIFIER_POLICY") {
            config.identifier_policy =
                crate::domains::migrations::IdentifierPolicy::from_str(&policy)
                    .map_err(ConfigError::EnvError)?;
        }

        Ok(())
    }

    fn apply_store_overrides(
        &self,
        config: &mut crate::domains::store::StoreConfig,
    ) -> ConfigResult<()> {
        if let Ok(dir) = self.get_env_var("DATA_DIR") {
            config.backend = StoreBackend::File {
                data_dir: PathBuf::from(dir),
            };
        }

        if let Ok(backend) = self.get_env_var("STORE_BACKEND") {
            match backend.to_lowercase().as_str() {
                "in_memory" | "memory" => config.backend = StoreBackend::InMemory,
                "file" => {
                    if !matches!(config.backend, StoreBackend::File { .. }) {
                        config.backend = StoreBackend::default();
                    }
                }
                other => {
                    return Err(ConfigError::EnvError(format!(
                        "Invalid STORE_BACKEND: {}",
                        other
                    )))
                }
            }
        }

        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}
