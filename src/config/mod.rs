//! config
//!
//! Configuration loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables (`CMIS_URL`, `CMIS_USERNAME`, `CMIS_PASSWORD`,
//!    `CMIS_BINDING`)
//! 4. CLI flags (not handled here)
//!
//! # Config File Locations
//!
//! Searched in order, first hit wins:
//! 1. `$CMIS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/cmis/config.toml`
//! 3. `~/.cmis/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use cmisclient::config::ClientConfig;
//!
//! let result = ClientConfig::load().unwrap();
//! println!("Connecting to {}", result.config.url());
//! ```

pub mod schema;

pub use schema::{ClientConfig, DEFAULT_TIMEOUT_SECS};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration, environment overrides applied.
    pub config: ClientConfig,
    /// The file it was read from, if any.
    pub path: Option<PathBuf>,
}

impl ClientConfig {
    /// Load configuration from the default locations and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or
    /// parsed. A missing file is not an error (defaults are used).
    pub fn load() -> Result<ConfigLoadResult, ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Read one config file.
    pub fn read(path: &Path) -> Result<ClientConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Like [`ClientConfig::load`] with `env` standing in for the process
    /// environment.
    pub(crate) fn load_with(
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let path = Self::find_file(&env);
        let mut config = match &path {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                Self::read(path)?
            }
            None => ClientConfig::default(),
        };
        config.apply_env(&env);
        Ok(ConfigLoadResult { config, path })
    }

    fn find_file(env: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        // 1. $CMIS_CONFIG
        if let Some(path) = env("CMIS_CONFIG").map(PathBuf::from) {
            if path.exists() {
                return Some(path);
            }
        }

        // 2. $XDG_CONFIG_HOME/cmis/config.toml
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("cmis/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. ~/.cmis/config.toml
        Self::home_file().ok().filter(|path| path.exists())
    }

    /// `~/.cmis/config.toml`.
    pub fn home_file() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".cmis/config.toml"))
            .ok_or(ConfigError::NoHomeDir)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) {
        let overrides = [
            ("CMIS_URL", &mut self.url),
            ("CMIS_USERNAME", &mut self.username),
            ("CMIS_PASSWORD", &mut self.password),
            ("CMIS_BINDING", &mut self.binding),
        ];
        for (name, slot) in overrides {
            if let Some(value) = env(name).filter(|v| !v.is_empty()) {
                debug!(variable = name, "config value from environment");
                *slot = Some(value);
            }
        }
    }
}
