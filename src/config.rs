use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub source: AdapterConfig,
    pub target: AdapterConfig,
}

/// An adapter section: a `kind` picking the implementation and a free-form
/// `spec` table the implementation interprets.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdapterConfig {
    pub kind: String,
    #[serde(default, alias = "data")]
    pub spec: toml::Table,
}

impl AdapterConfig {
    /// Interpret the spec table as the typed spec of `kind`.
    pub fn decode_spec<T: DeserializeOwned>(&self, kind: &'static str) -> Result<T, ConfigError> {
        toml::Value::Table(self.spec.clone())
            .try_into()
            .map_err(|source| ConfigError::InvalidSpec { kind, source })
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join("timesheets").join("config.toml");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".config").join("timesheets").join("config.toml");
    }
    PathBuf::from("config.toml")
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    Ok(config)
}

pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}
