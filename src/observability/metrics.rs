//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters shared by the store and the handler
///
/// All counters use Relaxed atomics; exact cross-counter consistency is not
/// needed for reporting.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    requests_succeeded: AtomicU64,
    requests_failed: AtomicU64,
    records_appended: AtomicU64,
    /// Loads that found an unparsable document and fell back to empty
    corrupt_loads: AtomicU64,
    write_retries: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_requests_succeeded(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_appended(&self) {
        self.records_appended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_corrupt_loads(&self) {
        self.corrupt_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_write_retries(&self) {
        self.write_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn corrupt_loads(&self) -> u64 {
        self.corrupt_loads.load(Ordering::Relaxed)
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            records_appended: self.records_appended.load(Ordering::Relaxed),
            corrupt_loads: self.corrupt_loads.load(Ordering::Relaxed),
            write_retries: self.write_retries.load(Ordering::Relaxed),
        }
    }
}

/// Immutable copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    pub records_appended: u64,
    pub corrupt_loads: u64,
    pub write_retries: u64,
}

impl MetricsSnapshot {
    /// Render as log fields, keys matching the counter names
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("corrupt_loads", self.corrupt_loads.to_string()),
            ("records_appended", self.records_appended.to_string()),
            ("requests_failed", self.requests_failed.to_string()),
            ("requests_succeeded", self.requests_succeeded.to_string()),
            ("write_retries", self.write_retries.to_string()),
        ]
    }
}
