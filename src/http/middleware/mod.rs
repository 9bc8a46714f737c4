//! Axum middleware.

pub mod metadata_scope;
pub mod request_log;

pub use metadata_scope::metadata_scope_middleware;
pub use request_log::{request_log_middleware, CompletionGuard, CLIENT_CLOSED_REQUEST};
