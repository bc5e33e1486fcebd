//! Client configuration.
//!
//! # Responsibility
//! - Hold the tunables shared by search, session and mutation components.
//! - Load from JSON with every field defaulted.
//!
//! # Invariants
//! - A config that passed [`ClientConfig::validate`] has non-zero timings and
//!   limits and, when set, an http(s) catalog endpoint.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Quiet period before a search fetch fires.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Visible search results after filtering.
pub const DEFAULT_MAX_RESULTS: usize = 5;
/// Length at which a confirmation code is submitted automatically.
pub const DEFAULT_CONFIRMATION_CODE_LENGTH: usize = 6;
/// Group claim that unlocks the delete affordance.
pub const DEFAULT_ADMIN_GROUP: &str = "Administrators";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid { field, message } => write!(f, "invalid config `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables for one client instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub debounce_ms: u64,
    pub max_results: usize,
    pub confirmation_code_length: usize,
    pub admin_group: String,
    /// GraphQL endpoint of the remote catalog. `None` selects no HTTP adapter.
    pub catalog_endpoint: Option<String>,
    pub catalog_api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_results: DEFAULT_MAX_RESULTS,
            confirmation_code_length: DEFAULT_CONFIRMATION_CODE_LENGTH,
            admin_group: DEFAULT_ADMIN_GROUP.to_string(),
            catalog_endpoint: None,
            catalog_api_key: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.debounce_ms == 0 {
            return Err(invalid("debounce_ms", "must be greater than zero"));
        }
        if self.max_results == 0 {
            return Err(invalid("max_results", "must be greater than zero"));
        }
        if self.confirmation_code_length == 0 {
            return Err(invalid(
                "confirmation_code_length",
                "must be greater than zero",
            ));
        }
        if self.admin_group.trim().is_empty() {
            return Err(invalid("admin_group", "must not be blank"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "must be greater than zero"));
        }
        if let Some(endpoint) = &self.catalog_endpoint {
            let endpoint = endpoint.trim();
            if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                return Err(invalid(
                    "catalog_endpoint",
                    format!("expected an http(s) URL, got `{endpoint}`"),
                ));
            }
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}
