//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! MM_* environment variables / TOML file
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → TransportConfig (validated, immutable)
//!     → MetricCollector::new (fails fast on error)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Missing credential or base URL is fatal at startup, not at first send
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{from_env, load_config, ConfigError};
pub use schema::{AuthStyle, OutputMode, TransportConfig};
pub use validation::ValidationError;
