//! Client configuration via `dataapi.toml`
//!
//! Every field has a default, so an empty file is a valid configuration
//! once `endpoint` is set. Timeouts can also be overridden per collection,
//! per table and per call; see [`Timeouts::merge`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dataapi_serdes::{CamelToSnakeCase, KeyTransformer, SerDesOptions};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable read when no token is configured
pub const DEFAULT_TOKEN_ENV: &str = "DATAAPI_TOKEN";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for operations spanning several requests
pub const DEFAULT_GENERAL_METHOD_TIMEOUT_MS: u64 = 30_000;

/// Timeout overrides. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Limit for one HTTP request (one page fetch, one insert chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
    /// Limit for a whole operation that may issue several requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_method_timeout_ms: Option<u64>,
}

impl Timeouts {
    /// Override only the request timeout
    pub fn request(ms: u64) -> Self {
        Self {
            request_timeout_ms: Some(ms),
            general_method_timeout_ms: None,
        }
    }

    /// Layer `self` over `fallback`; set fields in `self` win.
    pub fn merge(&self, fallback: &Timeouts) -> Timeouts {
        Timeouts {
            request_timeout_ms: self.request_timeout_ms.or(fallback.request_timeout_ms),
            general_method_timeout_ms: self
                .general_method_timeout_ms
                .or(fallback.general_method_timeout_ms),
        }
    }

    /// Effective request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS))
    }

    /// Effective whole-operation timeout
    pub fn general_method_timeout(&self) -> Duration {
        Duration::from_millis(
            self.general_method_timeout_ms
                .unwrap_or(DEFAULT_GENERAL_METHOD_TIMEOUT_MS),
        )
    }
}

/// Key naming convention applied between host and wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyTransform {
    /// Keys are sent as written
    #[default]
    None,
    /// Host `camelCase` keys are sent as `snake_case`
    SnakeCase,
}

/// Serialization settings, shared by collections and tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerdesConfig {
    /// Engine switches
    #[serde(flatten)]
    pub options: SerDesOptions,
    /// Key naming convention
    pub key_transform: KeyTransform,
    /// Rename nested keys too (snake case only)
    pub transform_nested: bool,
    /// Leave `_id` untouched (snake case only)
    pub except_id: bool,
}

impl Default for SerdesConfig {
    fn default() -> Self {
        Self {
            options: SerDesOptions::default(),
            key_transform: KeyTransform::None,
            transform_nested: false,
            except_id: true,
        }
    }
}

impl SerdesConfig {
    /// Build the configured key transformer, if any
    pub fn key_transformer(&self) -> Option<Arc<dyn KeyTransformer>> {
        match self.key_transform {
            KeyTransform::None => None,
            KeyTransform::SnakeCase => Some(Arc::new(CamelToSnakeCase::new(
                self.transform_nested,
                self.except_id,
            ))),
        }
    }
}

/// Which command events reach listeners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFilter {
    /// Started, succeeded and failed
    #[default]
    All,
    /// Failures only
    Failures,
    /// Nothing
    None,
}

/// Event delivery settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Events delivered to listeners
    pub events: EventFilter,
}

/// Client configuration loaded from `dataapi.toml`.
///
/// # Example
///
/// ```toml
/// endpoint = "https://db.example.com"
/// keyspace = "default_keyspace"
///
/// [timeouts]
/// request_timeout_ms = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the service
    #[serde(default)]
    pub endpoint: String,
    /// Keyspace commands run against
    #[serde(default = "default_keyspace")]
    pub keyspace: String,
    /// Application token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Environment variable holding the token when `token` is unset
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Client-wide timeout defaults
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Serialization settings
    #[serde(default)]
    pub serdes: SerdesConfig,
    /// Event delivery settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_keyspace() -> String {
    "default_keyspace".to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            keyspace: default_keyspace(),
            token: None,
            token_env: default_token_env(),
            timeouts: Timeouts::default(),
            serdes: SerdesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration for an endpoint with every other field defaulted
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# DataAPI client configuration
#
# Base URL of the service (required)
endpoint = "http://localhost:8181"

# Keyspace used by collections and tables (default: "default_keyspace")
keyspace = "default_keyspace"

# Application token. When unset, read from the variable named by token_env.
# token = "AstraCS:..."
token_env = "DATAAPI_TOKEN"

[timeouts]
# One HTTP request, e.g. one cursor page (default: 10000)
request_timeout_ms = 10000
# Whole operations spanning several requests, e.g. insert_many (default: 30000)
general_method_timeout_ms = 30000

[serdes]
# Let the engine consume values handed to it instead of copying (default: false)
mutate_in_place = false
# Keep absent table columns absent instead of filling empties (default: false)
sparse_data = false
# Decode big integers and long decimals exactly (default: false)
enable_big_numbers = false
# Key naming: "none" (default) or "snake_case"
key_transform = "none"
# transform_nested = false
# except_id = true

[logging]
# Command events delivered to listeners: "all" (default), "failures" or "none"
events = "all"
"#
    }

    /// Check the configuration for values that can never work.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the endpoint or keyspace is empty or a timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::Config {
                reason: "endpoint must not be empty".to_string(),
            });
        }
        if self.keyspace.trim().is_empty() {
            return Err(Error::Config {
                reason: "keyspace must not be empty".to_string(),
            });
        }
        if self.timeouts.request_timeout_ms == Some(0)
            || self.timeouts.general_method_timeout_ms == Some(0)
        {
            return Err(Error::Config {
                reason: "timeouts must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the token from the config or the environment
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var(&self.token_env).ok())
            .filter(|t| !t.is_empty())
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            reason: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            Error::Config { reason } => Error::Config {
                reason: format!("{} ({})", reason, path.display()),
            },
            other => other,
        })
    }

    /// Parse and validate config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content).map_err(|e| Error::Config {
            reason: format!("Failed to parse config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Internal {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(path, content).map_err(|e| Error::Config {
            reason: format!("Failed to write config file '{}': {}", path.display(), e),
        })
    }
}
