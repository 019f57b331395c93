//! Configuration module for the p2pay CLI.
//!
//! Handles loading configuration from the TOML file and applying CLI and
//! environment overrides.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use p2pay_core::flow::FlowOptions;
use p2pay_sdk::client::ClientOptions;
use p2pay_sdk::objects::UserId;
use thiserror::Error;
use url::Url;

use crate::config::file::FileConfig;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./p2pay.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Values given on the command line or through the environment. They take
/// precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<Url>,
    pub uid: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub backend_url: Url,
    pub client: ClientOptions,
    pub flow: FlowOptions,
    pub uid: Option<UserId>,
}

pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    overrides: Overrides,
}

impl ConfigLoader {
    /// Create a new config loader.
    ///
    /// With `config_path = None` the default path is tried and a missing
    /// file means defaults; an explicit path must exist.
    pub fn new(config_path: Option<impl AsRef<Path>>, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.map(|p| p.as_ref().to_path_buf()),
            overrides,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = self.read_file()?;

        if let Some(backend) = &self.overrides.backend {
            file_config.backend.base_url = backend.to_string();
        }
        if let Some(uid) = &self.overrides.uid {
            file_config.account.uid = Some(uid.clone());
        }

        let backend_url = self.validate(&file_config)?;
        Ok(build_loaded_config(backend_url, file_config))
    }

    fn read_file(&self) -> Result<FileConfig, ConfigError> {
        let (path, explicit) = match &self.config_path {
            Some(path) => (path.as_path(), true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!("Configuration loaded from {:?}", path);
                Ok(toml::from_str(&content)?)
            }
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {:?}, using defaults", path);
                Ok(FileConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check the merged configuration and return the parsed backend URL.
    fn validate(&self, config: &FileConfig) -> Result<Url, ConfigError> {
        let backend_url = Url::parse(&config.backend.base_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "backend base_url {:?} is not a valid URL: {e}",
                config.backend.base_url
            ))
        })?;
        if !matches!(backend_url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "backend base_url must be http or https, got {backend_url}"
            )));
        }
        if config.backend.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend timeout_secs must be greater than zero".to_string(),
            ));
        }
        if config.flow.quote_debounce_ms == 0 {
            return Err(ConfigError::ValidationError(
                "flow quote_debounce_ms must be greater than zero".to_string(),
            ));
        }
        Ok(backend_url)
    }
}

fn build_loaded_config(backend_url: Url, file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        backend_url,
        client: ClientOptions {
            timeout: Duration::from_secs(file_config.backend.timeout_secs),
        },
        flow: FlowOptions {
            quote_debounce: Duration::from_millis(file_config.flow.quote_debounce_ms),
        },
        uid: file_config
            .account
            .uid
            .filter(|uid| !uid.trim().is_empty())
            .map(|uid| UserId::new(uid.trim())),
    }
}
