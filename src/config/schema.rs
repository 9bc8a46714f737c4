//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the collector receives the API key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`.
    #[default]
    Bearer,
    /// `<name>: <key>`.
    Header {
        #[serde(default = "default_auth_header")]
        name: String,
    },
}

fn default_auth_header() -> String {
    "x-api-key".to_string()
}

impl AuthStyle {
    /// Dedicated API-key header with the default name.
    pub fn api_key_header() -> Self {
        AuthStyle::Header {
            name: default_auth_header(),
        }
    }
}

/// Where outgoing events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Collector only.
    #[default]
    Remote,
    /// Collector, plus an info line per event through the collector's logger.
    RemoteWithEcho,
}

/// Connection settings for the remote collector.
#[derive(Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Collector base URL (e.g., "https://metrics.example.com").
    pub base_url: String,

    /// Credential sent with every request.
    pub api_key: String,

    /// Path segment between the base URL and the endpoint.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub auth: AuthStyle,

    #[serde(default)]
    pub output: OutputMode,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_version: default_api_version(),
            auth: AuthStyle::default(),
            output: OutputMode::default(),
        }
    }

    pub fn with_auth(mut self, auth: AuthStyle) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("auth", &self.auth)
            .field("output", &self.output)
            .finish()
    }
}
