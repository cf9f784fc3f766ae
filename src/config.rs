//! Configuration management for jmx-elastic-writer
//!
//! Handles loading and validating the writer configuration from YAML files
//! and resolving the root prefix.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Root prefix used when neither the config nor the settings map name one
pub const DEFAULT_ROOT_PREFIX: &str = "jmxtrans";

/// Suffix appended to the root prefix to form the index name
pub const INDEX_SUFFIX: &str = "_jmx-entries";

/// `${NAME}` or `${NAME:default}`
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::([^}]*))?\}").expect("placeholder pattern is valid")
});

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Elasticsearch writer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticWriterConfig {
    /// Elasticsearch endpoint URL
    #[serde(default = "default_connection_url")]
    pub connection_url: String,

    /// Prefix for the index name and metric keys
    #[serde(default)]
    pub root_prefix: Option<String>,

    /// Log every document at info level
    #[serde(default)]
    pub debug: bool,

    /// Store booleans as 1/0 instead of skipping them
    #[serde(default)]
    pub boolean_as_number: bool,

    /// Object name keys to include in metric keys
    #[serde(default)]
    pub type_names: Vec<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Optional username for basic auth
    #[serde(default)]
    pub username: Option<String>,

    /// Optional password for basic auth
    #[serde(default)]
    pub password: Option<String>,

    /// Free-form settings passed through from the agent
    #[serde(default)]
    pub settings: HashMap<String, serde_yaml::Value>,
}

fn default_connection_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout() -> u64 {
    5000
}

impl Default for ElasticWriterConfig {
    fn default() -> Self {
        Self {
            connection_url: default_connection_url(),
            root_prefix: None,
            debug: false,
            boolean_as_number: false,
            type_names: Vec::new(),
            timeout_ms: default_timeout(),
            username: None,
            password: None,
            settings: HashMap::new(),
        }
    }
}

impl ElasticWriterConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: ElasticWriterConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.connection_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "connectionUrl '{}' is not a valid URL: {}",
                self.connection_url, e
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "connectionUrl scheme must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "timeoutMs must be greater than 0".to_string(),
            ));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::ValidationError(
                "username and password must be set together".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve the root prefix
    ///
    /// Explicit `rootPrefix` wins over `settings.rootPrefix`, which wins over
    /// [`DEFAULT_ROOT_PREFIX`]. Placeholders are then resolved from the
    /// environment.
    pub fn resolved_root_prefix(&self) -> String {
        let raw = self
            .root_prefix
            .clone()
            .or_else(|| {
                self.settings
                    .get("rootPrefix")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_ROOT_PREFIX.to_string());

        resolve_props(&raw)
    }

    /// Index name derived from the root prefix
    pub fn index_name(&self) -> String {
        format!("{}{}", self.resolved_root_prefix(), INDEX_SUFFIX)
    }
}

/// Replace `${NAME}` / `${NAME:default}` placeholders with environment values.
///
/// Unset variables without a default are left as written.
pub fn resolve_props(input: &str) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(value) => value,
                Err(_) => caps
                    .get(2)
                    .map(|d| d.as_str().to_string())
                    .unwrap_or_else(|| caps[0].to_string()),
            }
        })
        .into_owned()
}
