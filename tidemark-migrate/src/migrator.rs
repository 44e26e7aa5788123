//! The migration engine

use std::sync::Arc;
use tidemark_config::{IdentifierPolicy, MigrationsConfig};
use tidemark_storage::{ChangelogEntry, ChangelogStore, CollectionChangelog, Database};

use crate::executor;
use crate::source::{MigrationLoader, MigrationSource};
use crate::status::{self, MigrationRecord};
use crate::{Direction, MigrateError, MigrateResult};

/// Default name of the changelog collection
pub const DEFAULT_CHANGELOG_COLLECTION: &str = "changelog";

/// Runs migrations from a source and keeps the changelog consistent with them
///
/// Every operation comes in two forms: one taking a [`Database`] that opens
/// the changelog collection inside it, and a `*_with` form taking any
/// [`ChangelogStore`].
#[derive(Clone)]
pub struct Migrator {
    loader: MigrationLoader,
    changelog_collection: String,
}

impl Migrator {
    pub fn new(source: Arc<dyn MigrationSource>) -> Self {
        Self {
            loader: MigrationLoader::new(source, IdentifierPolicy::default()),
            changelog_collection: DEFAULT_CHANGELOG_COLLECTION.to_string(),
        }
    }

    pub fn from_config(source: Arc<dyn MigrationSource>, config: &MigrationsConfig) -> Self {
        Self::new(source)
            .with_changelog_collection(&config.changelog_collection_name)
            .with_identifier_policy(config.identifier_policy)
    }

    /// Set custom changelog collection name
    pub fn with_changelog_collection(mut self, name: impl Into<String>) -> Self {
        self.changelog_collection = name.into();
        self
    }

    pub fn with_identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.loader = self.loader.with_policy(policy);
        self
    }

    pub fn changelog_collection(&self) -> &str {
        &self.changelog_collection
    }

    pub fn loader(&self) -> &MigrationLoader {
        &self.loader
    }

    /// The changelog this migrator keeps in `db`
    pub fn changelog(&self, db: &dyn Database) -> CollectionChangelog {
        CollectionChangelog::open(db, &self.changelog_collection)
    }

    /// Status of every discoverable migration
    pub async fn status(&self, db: &dyn Database) -> MigrateResult<Vec<MigrationRecord>> {
        self.status_with(&self.changelog(db)).await
    }

    pub async fn status_with(&self, changelog: &dyn ChangelogStore) -> MigrateResult<Vec<MigrationRecord>> {
        status::resolve(changelog, &self.loader).await
    }

    /// Reverse the most recently applied migration
    ///
    /// Returns the reverted identifier, or nothing when no migration is
    /// applied. The changelog entry is removed only after `down` succeeded.
    pub async fn down(&self, db: Arc<dyn Database>) -> MigrateResult<Vec<String>> {
        let changelog = self.changelog(db.as_ref());
        self.down_with(&changelog, db).await
    }

    pub async fn down_with(
        &self,
        changelog: &dyn ChangelogStore,
        db: Arc<dyn Database>,
    ) -> MigrateResult<Vec<String>> {
        let records = self.status_with(changelog).await?;

        let Some(last) = status::last_applied(&records) else {
            tracing::info!("No applied migrations, nothing to revert");
            return Ok(Vec::new());
        };
        let identifier = last.identifier.clone();

        let unit = self.loader.load(&identifier).await?;

        tracing::info!(migration = %identifier, "Migrating down");
        executor::run(&unit, Direction::Down, db).await?;

        match changelog.delete_one(&identifier).await {
            Ok(0) => {
                tracing::warn!(
                    migration = %identifier,
                    "Changelog entry was already gone after migrating down"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    migration = %identifier,
                    error = %e,
                    "Migrated down but the changelog still lists it; run `tidemark changelog forget {}` once the store is reachable",
                    identifier
                );
                return Err(MigrateError::ChangelogUpdate(e));
            }
        }

        tracing::info!(migration = %identifier, "Migrated down");
        Ok(vec![identifier])
    }

    /// Apply every pending migration in ascending identifier order
    ///
    /// Stops at the first failure; migrations applied before it stay applied
    /// and recorded.
    pub async fn up(&self, db: Arc<dyn Database>) -> MigrateResult<Vec<String>> {
        let changelog = self.changelog(db.as_ref());
        self.up_with(&changelog, db).await
    }

    pub async fn up_with(
        &self,
        changelog: &dyn ChangelogStore,
        db: Arc<dyn Database>,
    ) -> MigrateResult<Vec<String>> {
        let records = self.status_with(changelog).await?;
        let pending: Vec<String> = status::pending(&records)
            .into_iter()
            .map(|r| r.identifier.clone())
            .collect();

        if pending.is_empty() {
            tracing::info!("No pending migrations");
            return Ok(Vec::new());
        }

        let mut applied = Vec::with_capacity(pending.len());
        for identifier in pending {
            if let Err(e) = self.apply_one(changelog, db.clone(), &identifier).await {
                if !applied.is_empty() {
                    tracing::warn!(
                        applied = ?applied,
                        "Stopped after applying {} migration(s)",
                        applied.len()
                    );
                }
                return Err(e);
            }
            applied.push(identifier);
        }

        Ok(applied)
    }

    async fn apply_one(
        &self,
        changelog: &dyn ChangelogStore,
        db: Arc<dyn Database>,
        identifier: &str,
    ) -> MigrateResult<()> {
        let unit = self.loader.load(identifier).await?;

        tracing::info!(migration = %identifier, "Migrating up");
        executor::run(&unit, Direction::Up, db).await?;

        if let Err(e) = changelog.insert_one(&ChangelogEntry::applied_now(identifier)).await {
            tracing::error!(
                migration = %identifier,
                error = %e,
                "Migrated up but the changelog does not list it; run `tidemark changelog mark {}` once the store is reachable",
                identifier
            );
            return Err(MigrateError::ChangelogUpdate(e));
        }

        tracing::info!(migration = %identifier, "Migrated up");
        Ok(())
    }

    /// Remove the changelog entry for `identifier` without running anything
    pub async fn forget(&self, db: &dyn Database, identifier: &str) -> MigrateResult<()> {
        self.forget_with(&self.changelog(db), identifier).await
    }

    pub async fn forget_with(&self, changelog: &dyn ChangelogStore, identifier: &str) -> MigrateResult<()> {
        let removed = changelog
            .delete_one(identifier)
            .await
            .map_err(MigrateError::ChangelogUpdate)?;

        if removed == 0 {
            return Err(MigrateError::NotApplied(identifier.to_string()));
        }

        tracing::info!(migration = %identifier, "Removed changelog entry");
        Ok(())
    }

    /// Record `identifier` as applied without running it
    pub async fn mark_applied(&self, db: &dyn Database, identifier: &str) -> MigrateResult<ChangelogEntry> {
        self.mark_applied_with(&self.changelog(db), identifier).await
    }

    pub async fn mark_applied_with(
        &self,
        changelog: &dyn ChangelogStore,
        identifier: &str,
    ) -> MigrateResult<ChangelogEntry> {
        let records = self.status_with(changelog).await?;
        let record = records
            .iter()
            .find(|r| r.identifier == identifier)
            .ok_or_else(|| MigrateError::UnknownMigration(identifier.to_string()))?;

        if record.is_applied() {
            return Err(MigrateError::AlreadyApplied(identifier.to_string()));
        }

        let entry = ChangelogEntry::applied_now(identifier);
        changelog
            .insert_one(&entry)
            .await
            .map_err(MigrateError::ChangelogUpdate)?;

        tracing::info!(migration = %identifier, "Recorded migration as applied");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RegistrySource, ScriptedMigration, Step};
    use serde_json::json;
    use tidemark_storage::InMemoryDatabase;

    fn insert_step(collection: &str, name: &str) -> Step {
        Step::InsertOne {
            collection: collection.to_string(),
            document: json!({ "name": name }),
        }
    }

    fn script(name: &str) -> ScriptedMigration {
        ScriptedMigration {
            description: None,
            up: vec![insert_step("items", name)],
            down: vec![Step::DeleteMany {
                collection: "items".to_string(),
                filter: json!({ "name": name }),
            }],
        }
    }

    fn migrator() -> Migrator {
        let source = RegistrySource::new()
            .with_migration("20240101000000-a.yaml", script("a"))
            .with_migration("20240102000000-b.yaml", script("b"));
        Migrator::new(Arc::new(source))
    }

    async fn names(db: &InMemoryDatabase) -> Vec<String> {
        db.collection("items")
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_up_then_down_one_at_a_time() {
        let db = InMemoryDatabase::new();
        let migrator = migrator();

        let applied = migrator.up(Arc::new(db.clone())).await.unwrap();
        assert_eq!(applied, vec!["20240101000000-a.yaml", "20240102000000-b.yaml"]);
        assert_eq!(names(&db).await, vec!["a", "b"]);
        assert!(migrator.up(Arc::new(db.clone())).await.unwrap().is_empty());

        let reverted = migrator.down(Arc::new(db.clone())).await.unwrap();
        assert_eq!(reverted, vec!["20240102000000-b.yaml"]);
        assert_eq!(names(&db).await, vec!["a"]);

        let status = migrator.status(&db).await.unwrap();
        assert!(status[0].is_applied());
        assert!(!status[1].is_applied());

        migrator.down(Arc::new(db.clone())).await.unwrap();
        assert!(migrator.down(Arc::new(db.clone())).await.unwrap().is_empty());
        assert!(names(&db).await.is_empty());
    }

    #[tokio::test]
    async fn test_custom_changelog_collection() {
        let db = InMemoryDatabase::new();
        let migrator = migrator().with_changelog_collection("applied_migrations");
        migrator.up(Arc::new(db.clone())).await.unwrap();

        assert_eq!(
            db.collection("applied_migrations").find_all().await.unwrap().len(),
            2
        );
        assert!(db.collection("changelog").find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forget_and_mark_applied() {
        let db = InMemoryDatabase::new();
        let migrator = migrator();

        let entry = migrator.mark_applied(&db, "20240101000000-a.yaml").await.unwrap();
        assert_eq!(entry.file_name, "20240101000000-a.yaml");
        // Marking runs nothing
        assert!(names(&db).await.is_empty());

        assert!(matches!(
            migrator.mark_applied(&db, "20240101000000-a.yaml").await,
            Err(MigrateError::AlreadyApplied(_))
        ));
        assert!(matches!(
            migrator.mark_applied(&db, "20990101000000-nope.yaml").await,
            Err(MigrateError::UnknownMigration(_))
        ));

        migrator.forget(&db, "20240101000000-a.yaml").await.unwrap();
        assert!(matches!(
            migrator.forget(&db, "20240101000000-a.yaml").await,
            Err(MigrateError::NotApplied(_))
        ));
        assert!(migrator.status(&db).await.unwrap().iter().all(|r| !r.is_applied()));
    }

    #[tokio::test]
    async fn test_reject_policy_blocks_loading() {
        let source = RegistrySource::new().with_migration("init.yaml", script("a"));
        let migrator = Migrator::new(Arc::new(source)).with_identifier_policy(IdentifierPolicy::Reject);

        let err = migrator.up(Arc::new(InMemoryDatabase::new())).await.unwrap_err();
        assert!(matches!(err, MigrateError::Load(crate::LoadError::InvalidIdentifier(_))));
    }
}
