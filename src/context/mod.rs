//! Request-scoped metadata.
//!
//! # Data Flow
//! ```text
//! middleware (or caller) opens a scope
//!     → handler code calls set_metadata / insert_metadata
//!     → Logger reads get_metadata for every line
//!     → scope ends, metadata dropped with it
//!
//! No scope active (scripts, background jobs):
//!     → store's fallback slot, warning on every write
//! ```
//!
//! # Design Decisions
//! - Scopes are tokio task-locals, so isolation holds across `.await` points
//! - The fallback slot is only reachable from the no-scope branch
//! - Reads never fail; missing metadata is an empty map

pub mod metadata;
pub mod store;

pub use metadata::{MetadataValue, RequestMetadata};
pub use store::{in_scope, scope, ContextStore};
