//! Host server integration.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → request_log_middleware (start clock, open metadata scope)
//!     → host handlers
//!     → response body wrapped in ObservedBody
//!     → body dropped by the server (written or connection closed)
//!     → CompletionGuard fires → MetricCollector::dispatch (detached)
//! ```
//!
//! # Design Decisions
//! - Completion is tied to the body's lifetime, not to the handler returning
//! - The guard owns the observation, so it can be sent at most once
//! - A request abandoned before the handler returns is reported as 499

pub mod body;
pub mod middleware;

pub use body::ObservedBody;
pub use middleware::{metadata_scope_middleware, request_log_middleware};
