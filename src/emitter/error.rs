//! Delivery error definitions.

use thiserror::Error;

/// Errors that can occur while sending one event.
///
/// These never leave [`MetricCollector::deliver`](super::MetricCollector::deliver);
/// only [`MetricCollector::try_send`](super::MetricCollector::try_send) hands
/// them to the caller.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Collector answered with anything other than 200.
    #[error("collector returned status {0}")]
    Status(u16),

    /// Connection, TLS or protocol failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Event could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for emitter operations.
pub type EmitResult<T> = Result<T, EmitError>;
