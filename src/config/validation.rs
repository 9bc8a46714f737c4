//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the credential can travel in a header
//! - Check the base URL is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TransportConfig → Result<(), Vec<ValidationError>>
//! - Runs before a collector is constructed

use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::{AuthStyle, TransportConfig};

/// A single semantic problem with a [`TransportConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("api_key is empty")]
    MissingApiKey,

    #[error("api_key contains characters not allowed in an HTTP header")]
    InvalidApiKey,

    #[error("base_url '{url}' is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("base_url scheme '{0}' is not http or https")]
    UnsupportedScheme(String),

    #[error("auth header name '{0}' is invalid")]
    InvalidHeaderName(String),
}

pub fn validate_config(config: &TransportConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingApiKey);
    } else if HeaderValue::from_str(&config.api_key).is_err() {
        errors.push(ValidationError::InvalidApiKey);
    }

    match Url::parse(&config.base_url) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
        }
        Err(e) => errors.push(ValidationError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        }),
    }

    if let AuthStyle::Header { name } = &config.auth {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = TransportConfig::new("https://metrics.example.com", "secret");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let config = TransportConfig::new("ftp://metrics.example.com", "  ")
            .with_auth(AuthStyle::Header { name: "bad header".into() });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingApiKey,
                ValidationError::UnsupportedScheme("ftp".into()),
                ValidationError::InvalidHeaderName("bad header".into()),
            ]
        );
    }

    #[test]
    fn test_relative_url_rejected() {
        let config = TransportConfig::new("metrics.example.com/api", "secret");
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_key_with_newline_rejected() {
        let config = TransportConfig::new("https://metrics.example.com", "abc\ndef");
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::InvalidApiKey]);
    }
}
