//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use deflex_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Configuration file picked up from the working directory
const DEFAULT_CONFIG_FILE: &str = "deflex.toml";

/// Load layered configuration: defaults, file, environment, CLI
///
/// An explicitly given file must exist; the default file is optional.
pub fn load_config(path: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    let file = match path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    };
    if let Some(file) = file {
        tracing::debug!("Loading configuration from {}", file.display());
        config = config
            .load_from_file(&file)
            .with_context(|| format!("Failed to load configuration file {}", file.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}
