//! Observability subsystem
//!
//! - Structured logging (JSON, one event per line, stderr)
//! - Monotonic counters
//!
//! Observability is read-only: nothing here changes request outcomes.
//!
//! ```ignore
//! use user_database::observability::{Logger, MetricsRegistry};
//!
//! Logger::warn("STORE_DOCUMENT_CORRUPT", &[("path", "users.json")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_corrupt_loads();
//! ```

mod logger;
mod metrics;

pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
