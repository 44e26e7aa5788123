//! Changelog-consistent migration engine
//!
//! A [`Migrator`] resolves which migrations are applied by joining the
//! changelog with the migrations a [`MigrationSource`] can discover, runs a
//! migration's `up` or `down` through the [`executor`], and keeps the changelog
//! in step with what actually ran:
//!
//! - `down` reverses the applied migration with the greatest identifier and
//!   only then removes its changelog entry.
//! - `up` applies pending migrations in identifier order, recording each one.
//! - `forget` and `mark_applied` edit the changelog alone, for manual repair.
//!
//! Migration authors implement either [`Migration`] (async, returns a result)
//! or [`CallbackMigration`] (signals a [`Completion`]); both run identically.

pub mod error;
pub mod executor;
pub mod identifier;
pub mod migrator;
pub mod source;
pub mod status;
pub mod unit;

pub use error::{LoadError, MigrateError, MigrateResult, MigrationFailure};
pub use migrator::Migrator;
pub use source::{
    directory::DirectorySource,
    registry::RegistrySource,
    script::{ScriptedMigration, Step},
    MigrationLoader, MigrationSource,
};
pub use status::{AppliedAt, MigrationRecord};
pub use unit::{CallbackMigration, Completion, Convention, Direction, Migration, MigrationUnit};
