//! Configuration file handling

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tidemark_config::{ConfigLoader, TidemarkConfig};
use tracing::{error, info, warn};

/// Load configuration from file or use defaults
pub fn load_config(config_path: Option<&PathBuf>) -> Result<TidemarkConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) if path.exists() => loader
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        Some(path) => {
            warn!("Configuration file not found: {}. Using defaults.", path.display());
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

pub fn handle_config_sample() -> Result<()> {
    print!("{}", TidemarkConfig::generate_sample());
    Ok(())
}

pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {}", config_file.display());

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {}",
            config_file.display()
        ));
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_) => {
            println!("{}", "Configuration file is valid".green());
            Ok(())
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            Err(e).context("Configuration validation failed")
        }
    }
}
