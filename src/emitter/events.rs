//! Metric event types and their collector payloads.

use serde_json::{Map, Value};
use std::time::Duration;

use crate::context::metadata::json_number;
use crate::context::RequestMetadata;
use crate::emitter::error::{EmitError, EmitResult};

/// Marks whether a counter came from an automatic process or a manual trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricOrigin {
    Automatic,
    Manual,
}

impl MetricOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricOrigin::Automatic => "AUTO",
            MetricOrigin::Manual => "MANUAL",
        }
    }
}

/// Collector endpoint, relative to `{base_url}/{api_version}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Increment,
    ModelIo,
    RequestLog,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [Endpoint::Increment, Endpoint::ModelIo, Endpoint::RequestLog];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Increment => "increment",
            Endpoint::ModelIo => "modelIO",
            Endpoint::RequestLog => "requestLog",
        }
    }

    /// Body fields owned by the endpoint; metadata can never override these.
    fn reserved_fields(self) -> &'static [&'static str] {
        match self {
            Endpoint::Increment => &["metricName", "metricValue", "metricType"],
            Endpoint::ModelIo => &["modelName", "userInput", "modelOutput"],
            Endpoint::RequestLog => &[
                "path",
                "method",
                "requestDuration",
                "statusCode",
                "referer",
                "userAgent",
            ],
        }
    }
}

/// A named counter increment.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterEvent {
    name: String,
    value: f64,
    metadata: Option<RequestMetadata>,
    origin: Option<MetricOrigin>,
}

impl CounterEvent {
    /// A counter of value 1 with no metadata or origin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: 1.0,
            metadata: None,
            origin: None,
        }
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn metadata(mut self, metadata: RequestMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn origin(mut self, origin: MetricOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for CounterEvent {
    fn from(name: &str) -> Self {
        CounterEvent::new(name)
    }
}

impl From<String> for CounterEvent {
    fn from(name: String) -> Self {
        CounterEvent::new(name)
    }
}

/// One model invocation: what went in and what came out.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelIoEvent {
    model_name: String,
    input: String,
    output: String,
    metadata: Option<RequestMetadata>,
}

impl ModelIoEvent {
    pub fn new(
        model_name: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            input: input.into(),
            output: output.into(),
            metadata: None,
        }
    }

    pub fn metadata(mut self, metadata: RequestMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// What the middleware saw of one completed inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestObservation {
    pub path: String,
    pub method: String,
    pub duration: Duration,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub status_code: u16,
}

/// Everything the collector accepts, one variant per endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    Counter(CounterEvent),
    ModelIo(ModelIoEvent),
    RequestLog(RequestObservation),
}

impl MetricEvent {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            MetricEvent::Counter(_) => Endpoint::Increment,
            MetricEvent::ModelIo(_) => Endpoint::ModelIo,
            MetricEvent::RequestLog(_) => Endpoint::RequestLog,
        }
    }

    /// Flatten the event into the JSON object posted to its endpoint.
    ///
    /// Metadata entries are spread into the object first; reserved fields are
    /// written last and a metadata key naming one of them is dropped.
    pub fn to_body(&self) -> EmitResult<Map<String, Value>> {
        let endpoint = self.endpoint();
        match self {
            MetricEvent::Counter(event) => {
                let value = json_number(event.value).ok_or_else(|| {
                    EmitError::Serialization(format!(
                        "metricValue for '{}' is not finite",
                        event.name
                    ))
                })?;
                let mut fields = vec![
                    ("metricName", Value::String(event.name.clone())),
                    ("metricValue", value),
                ];
                if let Some(origin) = event.origin {
                    fields.push(("metricType", Value::String(origin.as_str().to_string())));
                }
                build_body(endpoint, event.metadata.as_ref(), fields)
            }
            MetricEvent::ModelIo(event) => build_body(
                endpoint,
                event.metadata.as_ref(),
                vec![
                    ("modelName", Value::String(event.model_name.clone())),
                    ("userInput", Value::String(event.input.clone())),
                    ("modelOutput", Value::String(event.output.clone())),
                ],
            ),
            MetricEvent::RequestLog(obs) => {
                let millis = u64::try_from(obs.duration.as_millis()).unwrap_or(u64::MAX);
                let mut fields = vec![
                    ("path", Value::String(obs.path.clone())),
                    ("method", Value::String(obs.method.clone())),
                    ("requestDuration", Value::from(millis)),
                    ("statusCode", Value::from(obs.status_code)),
                ];
                if let Some(referer) = &obs.referer {
                    fields.push(("referer", Value::String(referer.clone())));
                }
                if let Some(user_agent) = &obs.user_agent {
                    fields.push(("userAgent", Value::String(user_agent.clone())));
                }
                build_body(endpoint, None, fields)
            }
        }
    }
}

impl From<CounterEvent> for MetricEvent {
    fn from(event: CounterEvent) -> Self {
        MetricEvent::Counter(event)
    }
}

impl From<ModelIoEvent> for MetricEvent {
    fn from(event: ModelIoEvent) -> Self {
        MetricEvent::ModelIo(event)
    }
}

impl From<RequestObservation> for MetricEvent {
    fn from(obs: RequestObservation) -> Self {
        MetricEvent::RequestLog(obs)
    }
}

fn build_body(
    endpoint: Endpoint,
    metadata: Option<&RequestMetadata>,
    fields: Vec<(&'static str, Value)>,
) -> EmitResult<Map<String, Value>> {
    let reserved = endpoint.reserved_fields();
    let mut body = Map::new();

    if let Some(metadata) = metadata {
        for (key, value) in metadata.iter() {
            if reserved.contains(&key) {
                tracing::debug!(
                    endpoint = endpoint.path(),
                    key,
                    "metadata key collides with a reserved field; dropped"
                );
                continue;
            }
            let json = value.to_json().ok_or_else(|| {
                EmitError::Serialization(format!("metadata '{}' is not finite", key))
            })?;
            body.insert(key.to_string(), json);
        }
    }

    for (key, value) in fields {
        body.insert(key.to_string(), value);
    }

    Ok(body)
}
