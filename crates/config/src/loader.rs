//! Configuration loading from files and the environment

use crate::{AppConfig, ConfigError, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Supports TOML and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;

        match extension {
            "toml" => Self::from_toml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}",
                extension
            ))),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<AppConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from environment variables only
    ///
    /// Variables use the format `DATASHOP_SECTION__KEY`, for example
    /// `DATASHOP_SUPPLIERS__DEFAULT_SUPPLIER=hubnet`
    pub fn from_env() -> Result<AppConfig> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("DATASHOP").separator("__"))
            .build()?;

        config.try_deserialize().map_err(ConfigError::from)
    }

    /// Load configuration from a file with environment variable overrides
    pub fn from_file_with_env(path: &Path) -> Result<AppConfig> {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        let config = Config::builder()
            .add_source(File::from(path).format(format))
            .add_source(Environment::with_prefix("DATASHOP").separator("__"))
            .build()?;

        config.try_deserialize().map_err(ConfigError::from)
    }
}
