//! Structured logging.
//!
//! # Responsibilities
//! - Prefix log lines with the current unit's metadata
//! - Route lines to the `tracing` sink or straight to the console
//! - Install the default subscriber for binaries and scripts
//!
//! # Design Decisions
//! - Uses tracing crate as the sink; formatting and transport belong to the subscriber
//! - Logging is infallible from the caller's point of view

pub mod init;
pub mod logger;

pub use init::init_tracing;
pub use logger::{Logger, LoggerOptions};
