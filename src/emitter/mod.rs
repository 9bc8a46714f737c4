//! Telemetry emission subsystem.
//!
//! # Data Flow
//! ```text
//! increment / capture_model_io / capture_request_log
//!     → MetricEvent (tagged by endpoint)
//!     → events.rs (flatten to JSON body, reserved fields win)
//!     → collector.rs (POST {base}/{version}/{endpoint} with auth header)
//!     → non-200 / network / serialization failure → one warning, dropped
//! ```
//!
//! # Design Decisions
//! - At-most-once, best-effort: no retry, no buffer, no batching
//! - One outbound request per event; concurrent events may arrive out of order
//! - The public sending methods spawn a detached task and return at once;
//!   `deliver` is the awaitable path for callers that choose to wait

pub mod collector;
pub mod error;
pub mod events;

pub use collector::MetricCollector;
pub use error::{EmitError, EmitResult};
pub use events::{
    CounterEvent, Endpoint, MetricEvent, MetricOrigin, ModelIoEvent, RequestObservation,
};
