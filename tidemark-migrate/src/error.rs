//! Migration error types

use std::path::PathBuf;
use thiserror::Error;
use tidemark_storage::StorageError;

use crate::unit::Direction;

/// Result type for engine operations
pub type MigrateResult<T> = std::result::Result<T, MigrateError>;

/// Error raised by a migration's own `up` or `down` code
pub type MigrationFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from discovering or loading migrations
#[derive(Debug, Error)]
pub enum LoadError {
    /// No migration with this identifier can be found
    #[error("Migration not found: {0}")]
    NotFound(String),

    /// The migration exists but could not be parsed
    #[error("Could not parse migration {identifier}: {message}")]
    Malformed { identifier: String, message: String },

    /// Identifier lacks the sortable timestamp prefix
    #[error("Migration identifier '{0}' does not start with a sortable timestamp (expected <digits>-<description>)")]
    InvalidIdentifier(String),

    /// Two migrations share an identifier
    #[error("Duplicate migration identifier: {0}")]
    Duplicate(String),

    /// The migration file exists but could not be read
    #[error("Could not read migration {identifier}: {source}")]
    Read {
        identifier: String,
        #[source]
        source: std::io::Error,
    },

    /// The migrations directory is missing or unreadable
    #[error("Migrations directory {}: {message}", .path.display())]
    Directory { path: PathBuf, message: String },
}

/// Migration engine errors
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Reading the changelog failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Discovering or loading a migration failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The migration's own code failed; store and changelog still agree
    #[error("Could not migrate {direction} {identifier}: {source}")]
    Execution {
        direction: Direction,
        identifier: String,
        source: MigrationFailure,
    },

    /// The migration ran but its changelog entry could not be written or removed
    #[error("Could not update changelog: {0}")]
    ChangelogUpdate(#[source] StorageError),

    /// Repair target has no changelog entry
    #[error("Migration {0} is not recorded as applied")]
    NotApplied(String),

    /// Repair target already has a changelog entry
    #[error("Migration {0} is already recorded as applied")]
    AlreadyApplied(String),

    /// Repair target is not a discoverable migration
    #[error("Unknown migration: {0}")]
    UnknownMigration(String),
}

impl MigrateError {
    /// True when the store and changelog may no longer agree
    pub fn is_divergent(&self) -> bool {
        matches!(self, MigrateError::ChangelogUpdate(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_message_keeps_cause_verbatim() {
        let err = MigrateError::Execution {
            direction: Direction::Down,
            identifier: "20160609113225-last_migration.js".to_string(),
            source: "Invalid syntax".into(),
        };
        assert_eq!(
            err.to_string(),
            "Could not migrate down 20160609113225-last_migration.js: Invalid syntax"
        );
        assert!(!err.is_divergent());
    }

    #[test]
    fn test_changelog_update_message() {
        let err = MigrateError::ChangelogUpdate(StorageError::Backend("Could not delete".to_string()));
        assert_eq!(err.to_string(), "Could not update changelog: Could not delete");
        assert!(err.is_divergent());
    }

    #[test]
    fn test_storage_and_load_errors_are_transparent() {
        let err: MigrateError = StorageError::Backend("timeout".to_string()).into();
        assert_eq!(err.to_string(), "timeout");

        let err: MigrateError = LoadError::NotFound("x.yaml".to_string()).into();
        assert_eq!(err.to_string(), "Migration not found: x.yaml");
    }
}
