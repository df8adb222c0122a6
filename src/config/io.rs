//! Configuration I/O operations

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::Config;

/// Get the config file path (~/.config/ptyrec/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let config_dir = config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Get the config directory path (~/.config/ptyrec)
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("ptyrec"))
}

/// Load configuration from `path` (or the default location), returning
/// defaults if the file does not exist.
///
/// A missing home directory only matters when no explicit path was given,
/// and then just means there is no config file.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Ok(p) => p,
            Err(_) => return Ok(Config::default()),
        },
    };

    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        parse(&contents).with_context(|| format!("Invalid config file: {:?}", config_path))
    } else {
        tracing::debug!("no config file at {:?}, using defaults", config_path);
        Ok(Config::default())
    }
}

/// Parse and validate a TOML config document.
pub fn parse(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).context("Failed to parse config")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    Ok(config)
}
