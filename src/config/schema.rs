//! config::schema
//!
//! The client configuration file.
//!
//! # Validation
//!
//! Values are checked by [`ClientConfig::validate`] once every source has
//! been applied, since a file may legitimately leave the URL to the
//! environment or the command line.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::binding::BindingKind;
use crate::transport::Credentials;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings.
///
/// # Example
///
/// ```toml
/// url = "http://localhost:8080/alfresco/cmisatom"
/// binding = "atompub"
/// username = "admin"
/// password = "admin"
/// repository_id = "main"
/// timeout_secs = 60
/// ```
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Service document URL
    pub url: Option<String>,

    /// `atompub` or `browser`; detected from the URL when absent
    pub binding: Option<String>,

    pub username: Option<String>,

    pub password: Option<String>,

    /// Repository to open; the first advertised one when absent
    pub repository_id: Option<String>,

    /// HTTP timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Overrides the default User-Agent header
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("binding", &self.binding)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("repository_id", &self.repository_id)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.as_deref().unwrap_or("").trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidValue(
                "url is required (config file, CMIS_URL or --url)".to_string(),
            ));
        }
        let parsed = url::Url::parse(url)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid url '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "url '{}' must use http or https",
                url
            )));
        }

        if let Some(binding) = &self.binding {
            if BindingKind::parse(binding).is_none() {
                let names: Vec<&str> = BindingKind::all().iter().map(|k| k.name()).collect();
                return Err(ConfigError::InvalidValue(format!(
                    "invalid binding '{}', must be one of: {}",
                    binding,
                    names.join(", ")
                )));
            }
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Service URL, empty when unset.
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Basic credentials when a username is configured.
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|user| {
            Credentials::new(user.clone(), self.password.clone().unwrap_or_default())
        })
    }
}
