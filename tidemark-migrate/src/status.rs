//! Joining the changelog with discoverable migrations

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use tidemark_storage::ChangelogStore;

use crate::source::MigrationLoader;
use crate::MigrateResult;

/// When a migration was applied, or that it has not been
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedAt {
    Pending,
    At(DateTime<Utc>),
}

impl AppliedAt {
    pub fn is_pending(&self) -> bool {
        matches!(self, AppliedAt::Pending)
    }
}

impl fmt::Display for AppliedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppliedAt::Pending => write!(f, "PENDING"),
            AppliedAt::At(at) => write!(f, "{}", at.to_rfc3339()),
        }
    }
}

impl Serialize for AppliedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AppliedAt::Pending => serializer.serialize_str("PENDING"),
            AppliedAt::At(at) => at.serialize(serializer),
        }
    }
}

/// Status of one discoverable migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    #[serde(rename = "fileName")]
    pub identifier: String,
    pub applied_at: AppliedAt,
}

impl MigrationRecord {
    pub fn is_applied(&self) -> bool {
        !self.applied_at.is_pending()
    }
}

/// Status of every discoverable migration, sorted ascending by identifier
pub async fn resolve(
    changelog: &dyn ChangelogStore,
    loader: &MigrationLoader,
) -> MigrateResult<Vec<MigrationRecord>> {
    let applied: HashMap<String, DateTime<Utc>> = changelog
        .find_all()
        .await?
        .into_iter()
        .map(|entry| (entry.file_name, entry.applied_at))
        .collect();

    let identifiers = loader.identifiers().await?;

    let records: Vec<MigrationRecord> = identifiers
        .into_iter()
        .map(|identifier| {
            let applied_at = applied
                .get(&identifier)
                .map(|at| AppliedAt::At(*at))
                .unwrap_or(AppliedAt::Pending);
            MigrationRecord {
                identifier,
                applied_at,
            }
        })
        .collect();

    tracing::debug!(
        total = records.len(),
        applied = records.iter().filter(|r| r.is_applied()).count(),
        "Resolved migration status"
    );
    Ok(records)
}

/// The applied record with the greatest identifier
///
/// Ordering is by identifier alone; `applied_at` is never compared.
pub fn last_applied(records: &[MigrationRecord]) -> Option<&MigrationRecord> {
    records
        .iter()
        .filter(|r| r.is_applied())
        .max_by(|a, b| a.identifier.cmp(&b.identifier))
}

/// Pending records in ascending identifier order
pub fn pending(records: &[MigrationRecord]) -> Vec<&MigrationRecord> {
    let mut pending: Vec<&MigrationRecord> = records.iter().filter(|r| !r.is_applied()).collect();
    pending.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    pending
}
