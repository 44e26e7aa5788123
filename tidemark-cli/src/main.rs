use anyhow::{Context, Result};
use clap::Parser;
use std::str::FromStr;
use tidemark_config::LogLevel;
use tidemark_logging::init_logging;
use tracing::info;

mod cli;
mod commands;

use cli::{ChangelogCommands, Cli, Commands, ConfigCommands};
use commands::{changelog, config, migrate, Workspace};

/// Load configuration, start logging and open the store
async fn open_workspace(cli: &Cli) -> Result<Workspace> {
    let mut config = config::load_config(cli.config.as_ref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = LogLevel::from_str(level)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid --log-level")?;
    }
    init_logging(&config.logging)?;

    info!("Tidemark CLI starting");
    Workspace::open(&config).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        // Config subcommands work on files directly and must not need a valid config
        Commands::Config { config_cmd } => {
            tidemark_logging::init_simple_tracing(cli.log_level.as_deref().unwrap_or("warn"))?;
            match config_cmd {
                ConfigCommands::Sample => config::handle_config_sample(),
                ConfigCommands::Validate { config_file } => {
                    config::handle_config_validate(config_file)
                }
            }
        }
        Commands::Status { json } => migrate::handle_status(&open_workspace(&cli).await?, *json).await,
        Commands::Up => migrate::handle_up(&open_workspace(&cli).await?).await,
        Commands::Down => migrate::handle_down(&open_workspace(&cli).await?).await,
        Commands::Create { description } => {
            migrate::handle_create(&open_workspace(&cli).await?, description).await
        }
        Commands::Changelog { changelog_cmd } => {
            let workspace = open_workspace(&cli).await?;
            match changelog_cmd {
                ChangelogCommands::Forget { id } => changelog::handle_forget(&workspace, id).await,
                ChangelogCommands::Mark { id } => changelog::handle_mark(&workspace, id).await,
            }
        }
    }
}
