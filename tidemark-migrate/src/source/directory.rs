//! Migrations stored as files in a directory
//!
//! The file name is the migration identifier, e.g.
//! `migrations/20240131093000-add_users.yaml`.

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tidemark_config::MigrationsConfig;
use tokio::io::AsyncWriteExt;

use super::script::ScriptedMigration;
use super::MigrationSource;
use crate::identifier;
use crate::{LoadError, MigrationUnit};

/// Scripted migrations read from `dir/*.<extension>`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    extension: String,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &MigrationsConfig) -> Self {
        Self::new(&config.migrations_dir, &config.file_extension)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an empty migration named after `description`, returning its path
    pub async fn create(&self, description: &str) -> Result<PathBuf, LoadError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.directory_error(e.to_string()))?;

        let id = identifier::new_identifier(Utc::now(), description, &self.extension);
        let path = self.dir.join(&id);

        let template = ScriptedMigration {
            description: Some(description.trim().to_string()),
            ..ScriptedMigration::default()
        };
        let content = if self.is_json(&id) {
            serde_json::to_string_pretty(&template).map_err(|e| self.directory_error(e.to_string()))?
        } else {
            serde_yaml::to_string(&template).map_err(|e| self.directory_error(e.to_string()))?
        };

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(LoadError::Duplicate(id)),
            Err(e) => return Err(self.directory_error(e.to_string())),
        };
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| self.directory_error(e.to_string()))?;
        file.flush().await.map_err(|e| self.directory_error(e.to_string()))?;

        tracing::info!(migration = %id, "Created migration {}", path.display());
        Ok(path)
    }

    fn is_json(&self, identifier: &str) -> bool {
        Path::new(identifier)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    }

    fn directory_error(&self, message: impl Into<String>) -> LoadError {
        LoadError::Directory {
            path: self.dir.clone(),
            message: message.into(),
        }
    }

    fn parse(&self, identifier: &str, content: &str) -> Result<ScriptedMigration, LoadError> {
        let parsed = if self.is_json(identifier) {
            serde_json::from_str(content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| LoadError::Malformed {
            identifier: identifier.to_string(),
            message,
        })
    }
}

#[async_trait]
impl MigrationSource for DirectorySource {
    async fn identifiers(&self) -> Result<Vec<String>, LoadError> {
        let is_dir = tokio::fs::metadata(&self.dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(self.directory_error("does not exist or is not a directory"));
        }

        // The directory itself is literal; only the file name is a pattern
        let dir = self
            .dir
            .to_str()
            .ok_or_else(|| self.directory_error("path is not valid UTF-8"))?;
        let pattern = Path::new(&glob::Pattern::escape(dir)).join(format!("*.{}", self.extension));
        let pattern = pattern
            .to_str()
            .ok_or_else(|| self.directory_error("path is not valid UTF-8"))?;

        let entries = glob::glob(pattern).map_err(|e| self.directory_error(e.to_string()))?;

        let mut identifiers = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| self.directory_error(e.to_string()))?;
            let is_file = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                identifiers.push(name.to_string());
            }
        }

        identifiers.sort();
        Ok(identifiers)
    }

    async fn load(&self, identifier: &str) -> Result<MigrationUnit, LoadError> {
        if identifier.contains(['/', '\\']) || identifier == ".." {
            return Err(LoadError::NotFound(identifier.to_string()));
        }

        let path = self.dir.join(identifier);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LoadError::NotFound(identifier.to_string()))
            }
            Err(source) => {
                return Err(LoadError::Read {
                    identifier: identifier.to_string(),
                    source,
                })
            }
        };

        let script = self.parse(identifier, &content)?;
        Ok(MigrationUnit::deferred(identifier, script))
    }
}
