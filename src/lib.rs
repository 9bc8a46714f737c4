//! Metric Mongrel telemetry client.
//!
//! Captures per-request metrics and application counters inside an axum
//! service and relays them to a remote collector without ever slowing down
//! or failing the host request.
//!
//! # Architecture Overview
//!
//! ```text
//!   inbound request
//!        │
//!        ▼
//!  ┌──────────────────┐   scope    ┌──────────────┐   reads   ┌──────────┐
//!  │ http::middleware │──────────▶│   context    │◀──────────│ logging  │
//!  │  (request log)   │           │ (task-local) │           │  Logger  │
//!  └────────┬─────────┘           └──────────────┘           └────┬─────┘
//!           │ dispatch (detached)                                 │ warn
//!           ▼                                                     │
//!  ┌──────────────────┐        POST {base}/{version}/{endpoint}   │
//!  │     emitter      │──────────────────────────────────────────▶ collector
//!  │ MetricCollector  │◀──────────────────────────────────────────┘
//!  └──────────────────┘
//! ```
//!
//! ```no_run
//! use axum::{middleware, routing::get, Router};
//! use metric_mongrel::{request_log_middleware, MetricCollector};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let collector = MetricCollector::from_env()?;
//! let app: Router = Router::new()
//!     .route("/orders", get(|| async { "ok" }))
//!     .layer(middleware::from_fn_with_state(collector.clone(), request_log_middleware));
//!
//! collector.increment("app_started");
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod context;
pub mod emitter;
pub mod logging;

// Host integration
pub mod config;
pub mod http;

pub use config::{AuthStyle, ConfigError, OutputMode, TransportConfig};
pub use context::{ContextStore, MetadataValue, RequestMetadata};
pub use emitter::{
    CounterEvent, EmitError, MetricCollector, MetricEvent, MetricOrigin, ModelIoEvent,
    RequestObservation,
};
pub use http::{metadata_scope_middleware, request_log_middleware};
pub use logging::{Logger, LoggerOptions};
