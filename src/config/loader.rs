//! Configuration loading from the environment or disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{AuthStyle, OutputMode, TransportConfig};
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_API_KEY: &str = "MM_API_KEY";
pub const ENV_BASE_URL: &str = "MM_BASE_URL";
pub const ENV_API_VERSION: &str = "MM_API_VERSION";
pub const ENV_AUTH_HEADER: &str = "MM_AUTH_HEADER";
pub const ENV_ECHO: &str = "MM_ECHO";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<TransportConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: TransportConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from `MM_*` environment variables.
pub fn from_env() -> Result<TransportConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a configuration from an arbitrary variable lookup.
pub fn from_lookup<F>(lookup: F) -> Result<TransportConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let api_key = non_empty(ENV_API_KEY).ok_or(ConfigError::MissingVar(ENV_API_KEY))?;
    let base_url = non_empty(ENV_BASE_URL).ok_or(ConfigError::MissingVar(ENV_BASE_URL))?;

    let mut config = TransportConfig::new(base_url, api_key);
    if let Some(version) = lookup(ENV_API_VERSION) {
        config.api_version = version;
    }
    if let Some(name) = non_empty(ENV_AUTH_HEADER) {
        config.auth = AuthStyle::Header { name };
    }
    if let Some(echo) = lookup(ENV_ECHO) {
        if matches!(echo.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes") {
            config.output = OutputMode::RemoteWithEcho;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
