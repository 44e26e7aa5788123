//! Running one direction of one migration

use std::sync::Arc;
use thiserror::Error;
use tidemark_storage::Database;

use crate::unit::{Completion, Operations};
use crate::{Direction, MigrateError, MigrateResult, MigrationFailure, MigrationUnit};

/// A callback migration dropped its [`Completion`] without calling it
#[derive(Debug, Error)]
#[error("completion callback dropped without being invoked")]
pub struct CompletionDropped;

/// Run `direction` of `unit` against `db` and wait for it to finish
///
/// Both completion conventions end up here as the same result; a failure is
/// wrapped with the migration identifier and direction, the cause untouched.
pub async fn run(unit: &MigrationUnit, direction: Direction, db: Arc<dyn Database>) -> MigrateResult<()> {
    let outcome: Result<(), MigrationFailure> = match &unit.operations {
        Operations::Deferred(migration) => match direction {
            Direction::Up => migration.up(db).await,
            Direction::Down => migration.down(db).await,
        },
        Operations::Callback(migration) => {
            let (completion, receiver) = Completion::channel();
            match direction {
                Direction::Up => migration.up(db, completion),
                Direction::Down => migration.down(db, completion),
            }
            match receiver.await {
                Ok(None) => Ok(()),
                Ok(Some(error)) => Err(error),
                Err(_) => Err(Box::new(CompletionDropped)),
            }
        }
    };

    outcome.map_err(|source| MigrateError::Execution {
        direction,
        identifier: unit.identifier().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CallbackMigration, Migration};
    use async_trait::async_trait;
    use serde_json::json;
    use tidemark_storage::InMemoryDatabase;

    /// Writes a marker document, optionally failing afterwards
    #[derive(Clone)]
    struct Marker {
        fail_with: Option<&'static str>,
    }

    impl Marker {
        async fn mark(&self, db: &dyn Database, direction: &str) -> Result<(), MigrationFailure> {
            db.collection("marks").insert_one(json!({ "direction": direction })).await?;
            match self.fail_with {
                Some(message) => Err(message.into()),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl Migration for Marker {
        async fn up(&self, db: Arc<dyn Database>) -> Result<(), MigrationFailure> {
            self.mark(db.as_ref(), "up").await
        }

        async fn down(&self, db: Arc<dyn Database>) -> Result<(), MigrationFailure> {
            self.mark(db.as_ref(), "down").await
        }
    }

    /// Same behaviour, completing from a spawned task
    #[derive(Clone)]
    struct CallbackMarker(Marker);

    impl CallbackMarker {
        fn spawn(&self, db: Arc<dyn Database>, direction: &'static str, done: Completion) {
            let marker = self.0.clone();
            tokio::spawn(async move {
                match marker.mark(db.as_ref(), direction).await {
                    Ok(()) => done.ok(),
                    Err(e) => done.done(Some(e)),
                }
            });
        }
    }

    impl CallbackMigration for CallbackMarker {
        fn up(&self, db: Arc<dyn Database>, done: Completion) {
            self.spawn(db, "up", done)
        }

        fn down(&self, db: Arc<dyn Database>, done: Completion) {
            self.spawn(db, "down", done)
        }
    }

    struct Forgetful;

    impl CallbackMigration for Forgetful {
        fn up(&self, _db: Arc<dyn Database>, _done: Completion) {}

        fn down(&self, _db: Arc<dyn Database>, _done: Completion) {}
    }

    const ID: &str = "20160609113225-last_migration.js";

    fn units(fail_with: Option<&'static str>) -> [MigrationUnit; 2] {
        let marker = Marker { fail_with };
        [
            MigrationUnit::deferred(ID, marker.clone()),
            MigrationUnit::callback(ID, CallbackMarker(marker)),
        ]
    }

    #[tokio::test]
    async fn test_both_conventions_succeed_identically() {
        for unit in units(None) {
            let db = InMemoryDatabase::new();
            run(&unit, Direction::Down, Arc::new(db.clone())).await.unwrap();

            let marks = db.collection("marks").find_all().await.unwrap();
            assert_eq!(marks, vec![json!({"direction": "down"})], "{:?}", unit);
        }
    }

    #[tokio::test]
    async fn test_both_conventions_fail_identically() {
        for unit in units(Some("Invalid syntax")) {
            let db = InMemoryDatabase::new();
            let err = run(&unit, Direction::Down, Arc::new(db)).await.unwrap_err();
            assert_eq!(
                err.to_string(),
                "Could not migrate down 20160609113225-last_migration.js: Invalid syntax"
            );
        }

        for unit in units(Some("boom")) {
            let err = run(&unit, Direction::Up, Arc::new(InMemoryDatabase::new()))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), format!("Could not migrate up {}: boom", ID));
        }
    }

    #[tokio::test]
    async fn test_dropped_completion_is_a_failure() {
        let unit = MigrationUnit::callback(ID, Forgetful);
        let err = run(&unit, Direction::Down, Arc::new(InMemoryDatabase::new()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MigrateError::Execution { direction: Direction::Down, .. }
        ));
        assert!(err.to_string().ends_with("completion callback dropped without being invoked"));
    }
}
