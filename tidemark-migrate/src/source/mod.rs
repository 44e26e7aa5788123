//! Migration discovery and loading

pub mod directory;
pub mod registry;
pub mod script;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tidemark_config::IdentifierPolicy;

use crate::identifier;
use crate::{LoadError, MigrationUnit};

/// Where migrations come from
#[async_trait]
pub trait MigrationSource: Send + Sync {
    /// Identifiers of every discoverable migration, in any order
    async fn identifiers(&self) -> Result<Vec<String>, LoadError>;

    /// Load a fresh unit for `identifier`
    async fn load(&self, identifier: &str) -> Result<MigrationUnit, LoadError>;
}

/// A [`MigrationSource`] plus the identifier policy applied when loading
#[derive(Clone)]
pub struct MigrationLoader {
    source: Arc<dyn MigrationSource>,
    policy: IdentifierPolicy,
}

impl MigrationLoader {
    pub fn new(source: Arc<dyn MigrationSource>, policy: IdentifierPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> IdentifierPolicy {
        self.policy
    }

    pub fn with_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Discoverable identifiers, sorted ascending; duplicates are an error
    pub async fn identifiers(&self) -> Result<Vec<String>, LoadError> {
        let mut identifiers = self.source.identifiers().await?;

        let mut seen = HashSet::with_capacity(identifiers.len());
        for id in &identifiers {
            if !seen.insert(id.as_str()) {
                return Err(LoadError::Duplicate(id.clone()));
            }
        }

        identifiers.sort();
        Ok(identifiers)
    }

    /// Validate the identifier, then load its unit
    pub async fn load(&self, identifier: &str) -> Result<MigrationUnit, LoadError> {
        identifier::check(identifier, self.policy)?;

        let unit = self.source.load(identifier).await?;
        if unit.identifier() != identifier {
            return Err(LoadError::Malformed {
                identifier: identifier.to_string(),
                message: format!("source returned migration '{}' instead", unit.identifier()),
            });
        }
        tracing::debug!(
            migration = %identifier,
            convention = %unit.convention(),
            "Loaded migration"
        );
        Ok(unit)
    }
}
