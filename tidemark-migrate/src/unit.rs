//! Loaded migration units and the two ways migration code reports completion

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tidemark_storage::Database;
use tokio::sync::oneshot;

use crate::MigrationFailure;

/// Which way a migration is run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Migration whose operations complete by returning a result
#[async_trait]
pub trait Migration: Send + Sync {
    /// Apply the transformation
    async fn up(&self, db: Arc<dyn Database>) -> Result<(), MigrationFailure>;

    /// Reverse the transformation
    async fn down(&self, db: Arc<dyn Database>) -> Result<(), MigrationFailure>;
}

/// Migration whose operations complete by invoking a [`Completion`]
///
/// The operation may return before the work is finished; the migration is
/// done once `done` has been called, from any task or thread.
pub trait CallbackMigration: Send + Sync {
    fn up(&self, db: Arc<dyn Database>, done: Completion);

    fn down(&self, db: Arc<dyn Database>, done: Completion);
}

/// One-shot completion signal handed to a [`CallbackMigration`]
///
/// Dropping it without calling [`Completion::done`] counts as a failure.
pub struct Completion {
    sender: oneshot::Sender<Option<MigrationFailure>>,
}

impl Completion {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Option<MigrationFailure>>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Signal completion; `Some(error)` marks the operation as failed
    pub fn done(self, error: Option<MigrationFailure>) {
        // The executor stops listening only if it was itself dropped
        let _ = self.sender.send(error);
    }

    /// Signal success
    pub fn ok(self) {
        self.done(None)
    }

    /// Signal failure
    pub fn fail(self, error: impl Into<MigrationFailure>) {
        self.done(Some(error.into()))
    }
}

/// Completion style of a loaded migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Implements [`Migration`]
    Deferred,
    /// Implements [`CallbackMigration`]
    Callback,
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Convention::Deferred => write!(f, "deferred"),
            Convention::Callback => write!(f, "callback"),
        }
    }
}

#[derive(Clone)]
pub(crate) enum Operations {
    Deferred(Arc<dyn Migration>),
    Callback(Arc<dyn CallbackMigration>),
}

/// A loaded, runnable migration
///
/// The completion convention is fixed here, when the unit is built, so the
/// executor never has to inspect migration code at call time.
#[derive(Clone)]
pub struct MigrationUnit {
    identifier: String,
    pub(crate) operations: Operations,
}

impl MigrationUnit {
    /// Wrap a migration that completes by returning
    pub fn deferred(identifier: impl Into<String>, migration: impl Migration + 'static) -> Self {
        Self {
            identifier: identifier.into(),
            operations: Operations::Deferred(Arc::new(migration)),
        }
    }

    /// Wrap a migration that completes through a callback
    pub fn callback(
        identifier: impl Into<String>,
        migration: impl CallbackMigration + 'static,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            operations: Operations::Callback(Arc::new(migration)),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn convention(&self) -> Convention {
        match self.operations {
            Operations::Deferred(_) => Convention::Deferred,
            Operations::Callback(_) => Convention::Callback,
        }
    }
}

impl fmt::Debug for MigrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationUnit")
            .field("identifier", &self.identifier)
            .field("convention", &self.convention())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    struct NoopCallback;

    impl CallbackMigration for NoopCallback {
        fn up(&self, _db: Arc<dyn Database>, done: Completion) {
            done.ok()
        }

        fn down(&self, _db: Arc<dyn Database>, done: Completion) {
            done.ok()
        }
    }

    #[test]
    fn test_convention_is_fixed_at_construction() {
        let deferred = MigrationUnit::deferred("20240101000000-a.yaml", Noop);
        let callback = MigrationUnit::callback("20240101000001-b.yaml", NoopCallback);

        assert_eq!(deferred.convention(), Convention::Deferred);
        assert_eq!(callback.convention(), Convention::Callback);
        assert_eq!(callback.identifier(), "20240101000001-b.yaml");
        assert!(format!("{:?}", callback).contains("Callback"));
    }

    #[tokio::test]
    async fn test_completion_delivers_error() {
        let (completion, receiver) = Completion::channel();
        completion.fail("boom");
        let outcome = receiver.await.unwrap();
        assert_eq!(outcome.unwrap().to_string(), "boom");
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }
}
