//! Request instrumentation middleware.
//!
//! Produces exactly one [`RequestObservation`] per inbound request and hands
//! it to the collector on a detached task. The response is never held back.

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tokio::task::JoinHandle;

use crate::context::{self, ContextStore, RequestMetadata};
use crate::emitter::{MetricCollector, MetricEvent, RequestObservation};
use crate::http::body::ObservedBody;

/// Status reported when the client went away before a response existed.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

struct Pending {
    collector: MetricCollector,
    start: Instant,
    path: String,
    method: String,
    referer: Option<String>,
    user_agent: Option<String>,
    status_code: u16,
    metadata: RequestMetadata,
}

/// Fires the request's observation once, on first `fire` or on drop.
pub struct CompletionGuard {
    pending: Option<Pending>,
}

impl CompletionGuard {
    /// Capture the request line and headers and start the clock.
    pub fn start(collector: MetricCollector, request: &Request<Body>) -> Self {
        let path = request
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.path().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        let header_value = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };

        Self {
            pending: Some(Pending {
                collector,
                start: Instant::now(),
                path,
                method: request.method().to_string(),
                referer: header_value(header::REFERER),
                user_agent: header_value(header::USER_AGENT),
                status_code: CLIENT_CLOSED_REQUEST,
                metadata: RequestMetadata::new(),
            }),
        }
    }

    /// Record the handler's outcome.
    pub fn set_outcome(&mut self, status_code: u16, metadata: RequestMetadata) {
        if let Some(pending) = self.pending.as_mut() {
            pending.status_code = status_code;
            pending.metadata = metadata;
        }
    }

    /// Emit the observation. Later calls, and the drop, do nothing.
    pub fn fire(&mut self) -> Option<JoinHandle<()>> {
        let pending = self.pending.take()?;
        let observation = RequestObservation {
            path: pending.path,
            method: pending.method,
            duration: pending.start.elapsed(),
            referer: pending.referer,
            user_agent: pending.user_agent,
            status_code: pending.status_code,
        };

        tracing::debug!(
            path = %observation.path,
            method = %observation.method,
            status = observation.status_code,
            duration_ms = observation.duration.as_millis() as u64,
            "Request completed"
        );

        pending
            .collector
            .dispatch_with_metadata(MetricEvent::RequestLog(observation), pending.metadata)
    }

    pub fn is_fired(&self) -> bool {
        self.pending.is_none()
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let _ = self.fire();
    }
}

/// Axum middleware reporting every request to the collector.
///
/// Install with `axum::middleware::from_fn_with_state(collector,
/// request_log_middleware)`. The handler runs inside a fresh metadata scope,
/// so this replaces [`metadata_scope_middleware`](super::metadata_scope_middleware).
pub async fn request_log_middleware(
    State(collector): State<MetricCollector>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Dropped with this future if the client disconnects mid-handler.
    let mut guard = CompletionGuard::start(collector, &request);

    let (response, metadata) = context::scope(async move {
        let response = next.run(request).await;
        (response, ContextStore::global().get_metadata())
    })
    .await;

    guard.set_outcome(response.status().as_u16(), metadata);

    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(ObservedBody::new(body, guard)))
}
