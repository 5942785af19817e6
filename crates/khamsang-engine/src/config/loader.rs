//! Config discovery, parsing and validation.
//!
//! Lookup order: the file named by `KHAMSANG_CONFIG`, `./khamsang.yaml`,
//! `~/.khamsang/config.yaml`, then built-in defaults. A path given through
//! the environment must exist.

use super::schema::KhamsangConfig;
use khamsang_parser::LexiconError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_ENV: &str = "KHAMSANG_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Lexicon in config is inconsistent: {0}")]
    Lexicon(#[from] LexiconError),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub async fn load_default() -> Result<KhamsangConfig, ConfigError> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            return Self::load_from(Path::new(&explicit)).await;
        }

        for path in Self::default_paths() {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Self::load_from(&path).await;
            }
        }

        debug!("no config file found, using defaults");
        Ok(KhamsangConfig::default())
    }

    /// Files probed when `KHAMSANG_CONFIG` is unset, in order.
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("khamsang.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".khamsang").join("config.yaml"));
        }
        paths
    }

    pub async fn load_from(path: &Path) -> Result<KhamsangConfig, ConfigError> {
        debug!(path = %path.display(), "loading config");
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse YAML and check it. Blank input yields the defaults.
    pub fn parse(content: &str) -> Result<KhamsangConfig, ConfigError> {
        let config = if content.trim().is_empty() {
            KhamsangConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }
}
