//! Manual changelog repair

use anyhow::Result;
use colored::Colorize;

use super::Workspace;

pub async fn handle_forget(workspace: &Workspace, id: &str) -> Result<()> {
    workspace.migrator.forget(workspace.db.as_ref(), id).await?;
    println!("{} {}", "FORGOTTEN:".yellow(), id);
    Ok(())
}

pub async fn handle_mark(workspace: &Workspace, id: &str) -> Result<()> {
    let entry = workspace.migrator.mark_applied(workspace.db.as_ref(), id).await?;
    println!(
        "{} {} at {}",
        "MARKED APPLIED:".yellow(),
        entry.file_name,
        entry.applied_at.to_rfc3339()
    );
    Ok(())
}
