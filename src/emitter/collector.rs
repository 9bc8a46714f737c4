//! Collector client: the only component that talks to the remote endpoint.
//!
//! # Responsibilities
//! - Resolve endpoint URLs and the auth header once, at construction
//! - Serialize events and POST them
//! - Contain every delivery failure as a single warning
//! - Spawn detached deliveries for fire-and-forget callers

use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::validation::validate_config;
use crate::config::{AuthStyle, ConfigError, OutputMode, TransportConfig, ValidationError};
use crate::context::{self, RequestMetadata};
use crate::emitter::error::{EmitError, EmitResult};
use crate::emitter::events::{
    CounterEvent, Endpoint, MetricEvent, ModelIoEvent, RequestObservation,
};
use crate::logging::{Logger, LoggerOptions};

const LOGGER_NAME: &str = "mm-metrics-collector";

/// Endpoint URLs resolved against the configured base.
#[derive(Debug)]
struct EndpointUrls {
    increment: Url,
    model_io: Url,
    request_log: Url,
}

impl EndpointUrls {
    fn resolve(config: &TransportConfig) -> Result<Self, ConfigError> {
        let invalid = |reason: String| {
            ConfigError::Validation(vec![ValidationError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason,
            }])
        };

        let mut base = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        // Without a trailing slash `join` would replace the last path segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let version = config.api_version.trim_matches('/');
        let join = |endpoint: Endpoint| {
            let relative = if version.is_empty() {
                endpoint.path().to_string()
            } else {
                format!("{}/{}", version, endpoint.path())
            };
            base.join(&relative).map_err(|e| invalid(e.to_string()))
        };

        Ok(Self {
            increment: join(Endpoint::Increment)?,
            model_io: join(Endpoint::ModelIo)?,
            request_log: join(Endpoint::RequestLog)?,
        })
    }

    fn get(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Increment => &self.increment,
            Endpoint::ModelIo => &self.model_io,
            Endpoint::RequestLog => &self.request_log,
        }
    }
}

struct CollectorInner {
    client: reqwest::Client,
    endpoints: EndpointUrls,
    auth_name: HeaderName,
    auth_value: HeaderValue,
    output: OutputMode,
    logger: Logger,
}

/// Sends metric events to the remote collector.
///
/// Cloning is cheap and every clone shares one connection pool, so a single
/// collector can serve all concurrent requests. None of the public sending
/// methods return an error: a failed delivery is logged once as a warning
/// and dropped. Use [`MetricCollector::try_send`] when the caller needs the
/// outcome.
#[derive(Clone)]
pub struct MetricCollector {
    inner: Arc<CollectorInner>,
}

impl fmt::Debug for MetricCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricCollector")
            .field("endpoints", &self.inner.endpoints)
            .field("auth_header", &self.inner.auth_name)
            .field("output", &self.inner.output)
            .finish()
    }
}

impl MetricCollector {
    /// Create a collector, validating the configuration up front.
    pub fn new(config: TransportConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let endpoints = EndpointUrls::resolve(&config)?;
        let (auth_name, auth_value) = auth_header(&config)?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("metric-mongrel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ConfigError::Client)?;

        tracing::debug!(
            increment = %endpoints.increment,
            output = ?config.output,
            "Metric collector initialized"
        );

        Ok(Self {
            inner: Arc::new(CollectorInner {
                client,
                endpoints,
                auth_name,
                auth_value,
                output: config.output,
                logger: Logger::new(LOGGER_NAME, LoggerOptions::default()),
            }),
        })
    }

    /// Create a collector from `MM_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(crate::config::from_env()?)
    }

    /// Full URL events for `endpoint` are posted to.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> &Url {
        self.inner.endpoints.get(endpoint)
    }

    /// Increment a counter on a detached task. `&str` and `String` convert to
    /// a counter of 1.
    ///
    /// Returns as soon as the delivery is spawned. The handle may be dropped;
    /// awaiting it only waits for the delivery, which never fails.
    pub fn increment(&self, event: impl Into<CounterEvent>) -> Option<JoinHandle<()>> {
        self.dispatch(MetricEvent::Counter(event.into()))
    }

    /// Capture one model input/output pair on a detached task.
    pub fn capture_model_io(&self, event: ModelIoEvent) -> Option<JoinHandle<()>> {
        self.dispatch(MetricEvent::ModelIo(event))
    }

    /// Report one completed inbound request on a detached task.
    pub fn capture_request_log(&self, observation: RequestObservation) -> Option<JoinHandle<()>> {
        self.dispatch(MetricEvent::RequestLog(observation))
    }

    /// Send an event in the caller's task, logging instead of returning any
    /// failure. Suspends until the collector answers.
    pub async fn deliver(&self, event: MetricEvent) {
        if let Err(e) = self.try_send(&event).await {
            self.inner.logger.warn(&format!(
                "Failed to send {} metric: {}",
                event.endpoint().path(),
                e
            ));
        }
    }

    /// Send an event on a detached task and return immediately.
    ///
    /// The spawned delivery logs with the caller's current metadata. Dropping
    /// the returned handle does not cancel it. Outside a tokio runtime the
    /// event is dropped with a warning and `None` is returned.
    pub fn dispatch(&self, event: impl Into<MetricEvent>) -> Option<JoinHandle<()>> {
        self.dispatch_with_metadata(event.into(), self.inner.logger.metadata())
    }

    pub(crate) fn dispatch_with_metadata(
        &self,
        event: MetricEvent,
        metadata: RequestMetadata,
    ) -> Option<JoinHandle<()>> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                self.inner.logger.warn(&format!(
                    "No async runtime; dropped {} metric",
                    event.endpoint().path()
                ));
                return None;
            }
        };

        let collector = self.clone();
        Some(handle.spawn(context::scope(async move {
            collector.inner.logger.set_metadata(metadata);
            collector.deliver(event).await;
        })))
    }

    /// Serialize and POST one event, returning the outcome.
    pub async fn try_send(&self, event: &MetricEvent) -> EmitResult<()> {
        let endpoint = event.endpoint();
        let body = event.to_body()?;

        if self.inner.output == OutputMode::RemoteWithEcho {
            self.inner.logger.info(&format!(
                "{} {}",
                endpoint.path(),
                serde_json::Value::Object(body.clone())
            ));
        }

        let response = self
            .inner
            .client
            .post(self.inner.endpoints.get(endpoint).clone())
            .header(self.inner.auth_name.clone(), self.inner.auth_value.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(EmitError::Status(status.as_u16()));
        }

        tracing::trace!(endpoint = endpoint.path(), "metric delivered");
        Ok(())
    }
}

fn auth_header(config: &TransportConfig) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let (name, value) = match &config.auth {
        AuthStyle::Bearer => (
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key)),
        ),
        AuthStyle::Header { name } => (
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ConfigError::Validation(vec![ValidationError::InvalidHeaderName(name.clone())])
            })?,
            HeaderValue::from_str(&config.api_key),
        ),
    };

    let mut value =
        value.map_err(|_| ConfigError::Validation(vec![ValidationError::InvalidApiKey]))?;
    value.set_sensitive(true);
    Ok((name, value))
}
