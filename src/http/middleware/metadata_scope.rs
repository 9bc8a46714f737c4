//! Per-request metadata scope.

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::context;

/// Run each request inside its own metadata scope.
///
/// For hosts that want scoped logging without request telemetry. Install with
/// `axum::middleware::from_fn(metadata_scope_middleware)`.
pub async fn metadata_scope_middleware(request: Request<Body>, next: Next) -> Response {
    context::scope(next.run(request)).await
}
