//! Migration identifier conventions
//!
//! Identifiers are `<digits>-<description>[.<ext>]`. The leading timestamp is
//! what makes plain string order match creation order.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tidemark_config::IdentifierPolicy;

use crate::LoadError;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{8,}-[^/\\]+$").expect("identifier pattern is valid"));

/// Timestamp layout used for new identifiers
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Whether `identifier` carries a sortable timestamp prefix
pub fn is_conforming(identifier: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(identifier)
}

/// Apply `policy` to an identifier about to be loaded
pub fn check(identifier: &str, policy: IdentifierPolicy) -> Result<(), LoadError> {
    if is_conforming(identifier) {
        return Ok(());
    }

    match policy {
        IdentifierPolicy::Reject => Err(LoadError::InvalidIdentifier(identifier.to_string())),
        IdentifierPolicy::Warn => {
            tracing::warn!(
                migration = %identifier,
                "Migration identifier has no sortable timestamp prefix; ordering may not match creation order"
            );
            Ok(())
        }
    }
}

/// Build a new identifier such as `20240131093000-add_users.yaml`
pub fn new_identifier(now: DateTime<Utc>, description: &str, extension: &str) -> String {
    format!(
        "{}-{}.{}",
        now.format(TIMESTAMP_FORMAT),
        slugify(description),
        extension.trim_start_matches('.')
    )
}

fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    for c in description.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "migration".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_conforming_identifiers() {
        assert!(is_conforming("20160609113225-last_migration.js"));
        assert!(is_conforming("20240101-init"));
        assert!(!is_conforming("last_migration.js"));
        assert!(!is_conforming("2016-06-09-x.yaml"));
        assert!(!is_conforming("20160609113225-"));
    }

    #[test]
    fn test_policy() {
        assert!(check("init.yaml", IdentifierPolicy::Warn).is_ok());
        assert!(matches!(
            check("init.yaml", IdentifierPolicy::Reject),
            Err(LoadError::InvalidIdentifier(id)) if id == "init.yaml"
        ));
        assert!(check("20240101000000-init.yaml", IdentifierPolicy::Reject).is_ok());
    }

    #[test]
    fn test_new_identifier() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 9, 30, 0).unwrap();
        assert_eq!(
            new_identifier(now, "Add users  collection!", "yaml"),
            "20240131093000-add_users_collection.yaml"
        );
        assert_eq!(new_identifier(now, "???", ".json"), "20240131093000-migration.json");
        assert!(is_conforming(&new_identifier(now, "x", "yml")));
    }
}
