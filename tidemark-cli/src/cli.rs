//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Changelog-consistent data migrations", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which migrations are applied and which are pending
    Status {
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply all pending migrations
    Up,

    /// Revert the most recently applied migration
    Down,

    /// Create a new migration file
    Create {
        /// Short description, used in the file name
        description: String,
    },

    /// Edit the changelog without running migrations
    Changelog {
        #[command(subcommand)]
        changelog_cmd: ChangelogCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ChangelogCommands {
    /// Remove the entry for a migration, e.g. after a failed changelog update
    Forget {
        /// Migration identifier (file name)
        id: String,
    },

    /// Record a migration as applied without running it
    Mark {
        /// Migration identifier (file name)
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print a sample configuration with every default spelled out
    Sample,

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },
}
