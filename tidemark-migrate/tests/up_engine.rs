//! Behaviour of `Migrator::up` when a migration or the changelog fails

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tidemark_migrate::{MigrateError, Migration, MigrationFailure, Migrator, RegistrySource};
use tidemark_storage::testing::MockChangelog;
use tidemark_storage::{Database, InMemoryDatabase, StorageError};

const FIRST: &str = "20160609113224-first_migration.js";
const SECOND: &str = "20160609113225-second_migration.js";

/// Counts `up` calls and optionally fails them
#[derive(Clone, Default)]
struct Recorder {
    ups: Arc<AtomicUsize>,
    fail_with: Option<&'static str>,
}

impl Recorder {
    fn failing(message: &'static str) -> Self {
        Self {
            fail_with: Some(message),
            ..Self::default()
        }
    }

    fn up_calls(&self) -> usize {
        self.ups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Migration for Recorder {
    async fn up(&self, _db: Arc<dyn Database>) -> Result<(), MigrationFailure> {
        self.ups.fetch_add(1, Ordering::SeqCst);
        match self.fail_with {
            Some(message) => Err(message.into()),
            None => Ok(()),
        }
    }

    async fn down(&self, _db: Arc<dyn Database>) -> Result<(), MigrationFailure> {
        Ok(())
    }
}

fn migrator(first: Recorder, second: Recorder) -> Migrator {
    let source = RegistrySource::new()
        .with_migration(FIRST, first)
        .with_migration(SECOND, second);
    Migrator::new(Arc::new(source))
}

fn db() -> Arc<dyn Database> {
    Arc::new(InMemoryDatabase::new())
}

#[tokio::test]
async fn test_changelog_insert_failure_stops_the_run() {
    let (first, second) = (Recorder::default(), Recorder::default());
    let migrator = migrator(first.clone(), second.clone());

    let inserted = Arc::new(Mutex::new(Vec::new()));
    let seen = inserted.clone();

    let mut changelog = MockChangelog::new();
    changelog.expect_find_all().returning(|| Ok(Vec::new()));
    changelog.expect_insert_one().times(2).returning(move |entry| {
        let mut seen = seen.lock().unwrap();
        seen.push(entry.file_name.clone());
        if seen.len() == 1 {
            Ok(())
        } else {
            Err(StorageError::Backend("Could not insert".to_string()))
        }
    });

    let err = migrator.up_with(&changelog, db()).await.unwrap_err();

    assert!(err.is_divergent());
    assert_eq!(err.to_string(), "Could not update changelog: Could not insert");
    assert_eq!(*inserted.lock().unwrap(), vec![FIRST.to_string(), SECOND.to_string()]);
    // Both ran; only the first is recorded
    assert_eq!(first.up_calls(), 1);
    assert_eq!(second.up_calls(), 1);
}

#[tokio::test]
async fn test_failed_up_records_nothing_for_that_migration() {
    let first = Recorder::failing("Invalid syntax");
    let second = Recorder::default();
    let migrator = migrator(first.clone(), second.clone());

    let mut changelog = MockChangelog::new();
    changelog.expect_find_all().returning(|| Ok(Vec::new()));
    changelog.expect_insert_one().never();

    let err = migrator.up_with(&changelog, db()).await.unwrap_err();

    assert!(matches!(err, MigrateError::Execution { .. }));
    assert!(!err.is_divergent());
    assert_eq!(
        err.to_string(),
        "Could not migrate up 20160609113224-first_migration.js: Invalid syntax"
    );
    assert_eq!(second.up_calls(), 0);
}

#[tokio::test]
async fn test_failure_after_first_keeps_first_recorded() {
    let migrator = migrator(Recorder::default(), Recorder::failing("Duplicate key"));

    let mut changelog = MockChangelog::new();
    changelog.expect_find_all().returning(|| Ok(Vec::new()));
    changelog
        .expect_insert_one()
        .withf(|entry| entry.file_name == FIRST)
        .times(1)
        .returning(|_| Ok(()));

    let err = migrator.up_with(&changelog, db()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not migrate up 20160609113225-second_migration.js: Duplicate key"
    );
}
