//! Migration discovery and changelog configuration

use crate::error::ConfigResult;
use crate::validation::{validate_collection_name, validate_enum_choice, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// File extensions a migrations directory may use
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Migration configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Directory holding migration files
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// Name of the collection recording applied migrations
    #[serde(default = "default_changelog_collection_name")]
    pub changelog_collection_name: String,

    /// Extension of migration files in `migrations_dir`
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// What to do with identifiers lacking a sortable timestamp prefix
    #[serde(default)]
    pub identifier_policy: IdentifierPolicy,
}

/// Handling of identifiers that do not follow `<digits>-<description>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierPolicy {
    /// Refuse to load the migration
    Reject,
    /// Log a warning and load it anyway
    #[default]
    Warn,
}

impl fmt::Display for IdentifierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierPolicy::Reject => write!(f, "reject"),
            IdentifierPolicy::Warn => write!(f, "warn"),
        }
    }
}

impl FromStr for IdentifierPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" | "strict" => Ok(IdentifierPolicy::Reject),
            "warn" => Ok(IdentifierPolicy::Warn),
            _ => Err(format!("Invalid identifier policy: {}", s)),
        }
    }
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            changelog_collection_name: default_changelog_collection_name(),
            file_extension: default_file_extension(),
            identifier_policy: IdentifierPolicy::default(),
        }
    }
}

impl Validatable for MigrationsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_collection_name(
            &self.changelog_collection_name,
            "changelog_collection_name",
            self.domain_name(),
        )?;
        validate_enum_choice(
            &self.file_extension,
            &SUPPORTED_EXTENSIONS,
            "file_extension",
            self.domain_name(),
        )?;

        if self.migrations_dir.as_os_str().is_empty() {
            return Err(self.validation_error("migrations_dir cannot be empty"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "migrations"
    }
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_changelog_collection_name() -> String {
    "changelog".to_string()
}

fn default_file_extension() -> String {
    "yaml".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_config_defaults() {
        let config = MigrationsConfig::default();
        assert_eq!(config.migrations_dir, PathBuf::from("migrations"));
        assert_eq!(config.changelog_collection_name, "changelog");
        assert_eq!(config.file_extension, "yaml");
        assert_eq!(config.identifier_policy, IdentifierPolicy::Warn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_identifier_policy_from_str() {
        assert_eq!(IdentifierPolicy::from_str("REJECT").unwrap(), IdentifierPolicy::Reject);
        assert_eq!(IdentifierPolicy::from_str("strict").unwrap(), IdentifierPolicy::Reject);
        assert_eq!(IdentifierPolicy::from_str("warn").unwrap(), IdentifierPolicy::Warn);
        assert!(IdentifierPolicy::from_str("ignore").is_err());
    }

    #[test]
    fn test_migrations_config_validation() {
        let mut config = MigrationsConfig::default();
        config.changelog_collection_name = String::new();
        assert!(config.validate().is_err());

        let mut config = MigrationsConfig::default();
        config.file_extension = "sql".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("migrations"));
    }
}
