//! Migrations compiled into the binary

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::MigrationSource;
use crate::{CallbackMigration, LoadError, Migration, MigrationUnit};

type UnitFactory = Arc<dyn Fn(&str) -> MigrationUnit + Send + Sync>;

/// Code-registered migrations
///
/// Each load builds a new unit from a clone of the registered migration.
#[derive(Clone, Default)]
pub struct RegistrySource {
    factories: BTreeMap<String, UnitFactory>,
}

impl RegistrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration that completes by returning
    pub fn with_migration<M>(mut self, identifier: impl Into<String>, migration: M) -> Self
    where
        M: Migration + Clone + 'static,
    {
        let factory: UnitFactory =
            Arc::new(move |id| MigrationUnit::deferred(id, migration.clone()));
        self.factories.insert(identifier.into(), factory);
        self
    }

    /// Register a migration that completes through a callback
    pub fn with_callback_migration<M>(mut self, identifier: impl Into<String>, migration: M) -> Self
    where
        M: CallbackMigration + Clone + 'static,
    {
        let factory: UnitFactory =
            Arc::new(move |id| MigrationUnit::callback(id, migration.clone()));
        self.factories.insert(identifier.into(), factory);
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[async_trait]
impl MigrationSource for RegistrySource {
    async fn identifiers(&self) -> Result<Vec<String>, LoadError> {
        Ok(self.factories.keys().cloned().collect())
    }

    async fn load(&self, identifier: &str) -> Result<MigrationUnit, LoadError> {
        self.factories
            .get(identifier)
            .map(|factory| factory(identifier))
            .ok_or_else(|| LoadError::NotFound(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Completion, Convention, MigrationFailure};
    use tidemark_storage::Database;

    #[derive(Clone)]
    struct Noop;

    #[async_trait]
    impl Migration for Noop {
        async fn up(&self, _db: Arc<dyn Database>) -> Result<(), MigrationFailure> {
            Ok(())
        }

        async fn down(&self, _db: Arc<dyn Database>) -> Result<(), MigrationFailure> {
            Ok(())
        }
    }

    #[derive(Clone)]
    struct NoopCallback;

    impl CallbackMigration for NoopCallback {
        fn up(&self, _db: Arc<dyn Database>, done: Completion) {
            done.ok()
        }

        fn down(&self, _db: Arc<dyn Database>, done: Completion) {
            done.ok()
        }
    }

    #[tokio::test]
    async fn test_registry_loads_registered_units() {
        let source = RegistrySource::new()
            .with_migration("20240102000000-b", Noop)
            .with_callback_migration("20240101000000-a", NoopCallback);

        assert_eq!(source.len(), 2);
        assert_eq!(
            source.identifiers().await.unwrap(),
            vec!["20240101000000-a".to_string(), "20240102000000-b".to_string()]
        );

        let unit = source.load("20240101000000-a").await.unwrap();
        assert_eq!(unit.identifier(), "20240101000000-a");
        assert_eq!(unit.convention(), Convention::Callback);
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_not_found() {
        let source = RegistrySource::new();
        assert!(source.is_empty());
        assert!(matches!(
            source.load("20240101000000-missing").await,
            Err(LoadError::NotFound(_))
        ));
    }
}
