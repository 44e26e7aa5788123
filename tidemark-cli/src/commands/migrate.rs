//! `status`, `up`, `down` and `create`

use anyhow::{Context, Result};
use colored::Colorize;
use tidemark_migrate::{AppliedAt, MigrationRecord};
use tracing::info;

use super::Workspace;

pub async fn handle_status(workspace: &Workspace, json: bool) -> Result<()> {
    let records = workspace
        .migrator
        .status(workspace.db.as_ref())
        .await
        .context("Failed to resolve migration status")?;

    if json {
        let output = serde_json::to_string_pretty(&records).context("Failed to serialize status")?;
        println!("{}", output);
    } else {
        print!("{}", format_status(&records));
    }
    Ok(())
}

/// Two-column table, one migration per row
pub fn format_status(records: &[MigrationRecord]) -> String {
    if records.is_empty() {
        return "No migrations found\n".to_string();
    }

    let width = records
        .iter()
        .map(|r| r.identifier.len())
        .max()
        .unwrap_or(0)
        .max("Filename".len());

    let mut out = format!("{:<width$}  {}\n", "Filename".bold(), "Applied At".bold(), width = width);
    for record in records {
        let applied_at = match record.applied_at {
            AppliedAt::Pending => "PENDING".yellow(),
            AppliedAt::At(_) => record.applied_at.to_string().normal(),
        };
        out.push_str(&format!("{:<width$}  {}\n", record.identifier, applied_at, width = width));
    }
    out
}

pub async fn handle_up(workspace: &Workspace) -> Result<()> {
    let applied = workspace.migrator.up(workspace.db.clone()).await?;

    if applied.is_empty() {
        println!("Nothing to migrate");
    }
    for id in &applied {
        println!("{} {}", "MIGRATED UP:".green(), id);
    }
    Ok(())
}

pub async fn handle_down(workspace: &Workspace) -> Result<()> {
    let reverted = workspace.migrator.down(workspace.db.clone()).await?;

    if reverted.is_empty() {
        println!("Nothing to revert");
    }
    for id in &reverted {
        println!("{} {}", "MIGRATED DOWN:".green(), id);
    }
    Ok(())
}

pub async fn handle_create(workspace: &Workspace, description: &str) -> Result<()> {
    let path = workspace
        .source
        .create(description)
        .await
        .context("Failed to create migration")?;

    info!("Created {}", path.display());
    println!("{} {}", "CREATED:".green(), path.display());
    Ok(())
}
