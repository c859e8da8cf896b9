use crate::delivery::client::{DEFAULT_SOCKET_PATH, DEFAULT_SUBSCRIPTION_BUFFER};
use crate::error::{LogsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the delivery service socket path
pub const SOCKET_ENV_VAR: &str = "DEVLOGS_SOCKET";

/// Upper bound for the live subscription channel capacity
const MAX_SUBSCRIPTION_BUFFER: usize = 65536;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Unix socket of the log delivery service
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// Capacity of the live subscription event channel
    #[serde(default = "default_subscription_buffer")]
    pub subscription_buffer: usize,

    /// Default tracing filter for diagnostics on stderr
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions for serde
fn default_socket_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_PATH)
}

fn default_subscription_buffer() -> usize {
    DEFAULT_SUBSCRIPTION_BUFFER
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            subscription_buffer: default_subscription_buffer(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file, then apply the environment
    /// override for the socket path
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        config.apply_socket_override(std::env::var(SOCKET_ENV_VAR).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LogsError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config: Config = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| LogsError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| LogsError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(LogsError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Replace the socket path when an override value is present
    pub fn apply_socket_override(&mut self, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.socket_path = PathBuf::from(value);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(LogsError::ConfigValidation(
                "socket_path must not be empty".to_string(),
            ));
        }

        if self.subscription_buffer == 0 {
            return Err(LogsError::ConfigValidation(
                "subscription_buffer must be at least 1".to_string(),
            ));
        }

        if self.subscription_buffer > MAX_SUBSCRIPTION_BUFFER {
            return Err(LogsError::ConfigValidation(format!(
                "subscription_buffer cannot exceed {}",
                MAX_SUBSCRIPTION_BUFFER
            )));
        }

        if self.log_level.trim().is_empty() {
            return Err(LogsError::ConfigValidation(
                "log_level must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Expand environment variables in configuration fields
    fn expand_env_vars(&mut self) {
        let path_str = self.socket_path.to_string_lossy();
        self.socket_path = PathBuf::from(expand_env_in_string(&path_str));
        self.log_level = expand_env_in_string(&self.log_level);
    }
}

/// Expand `$VAR` and `${VAR}` references in a string
///
/// A bare `$VAR` name runs to the first character outside `[A-Za-z0-9_]`.
/// References to unset variables are left as written.
fn expand_env_in_string(s: &str) -> String {
    if !s.contains('$') {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, reference_len) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(close) => (&braced[..close], close + 3),
                None => ("", 1),
            }
        } else {
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..len], len + 1)
        };

        let value = if name.is_empty() {
            None
        } else {
            std::env::var(name).ok()
        };
        match value {
            Some(value) => result.push_str(&value),
            None => result.push_str(&rest[pos..pos + reference_len]),
        }
        rest = &rest[pos + reference_len..];
    }

    result.push_str(rest);
    result
}
