//! Metrics registry
//!
//! Counters only, monotonic, reset on process start.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters.
///
/// Uses Relaxed ordering; counters are independent of each other.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    validations_ok: AtomicU64,
    validations_rejected: AtomicU64,
    serializations_ok: AtomicU64,
    serializations_rejected: AtomicU64,
    schemas_loaded: AtomicU64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub validations_ok: u64,
    pub validations_rejected: u64,
    pub serializations_ok: u64,
    pub serializations_rejected: u64,
    pub schemas_loaded: u64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_validations(&self, ok: bool) {
        let counter = if ok {
            &self.validations_ok
        } else {
            &self.validations_rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_serializations(&self, ok: bool) {
        let counter = if ok {
            &self.serializations_ok
        } else {
            &self.serializations_rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_schemas_loaded(&self, count: u64) {
        self.schemas_loaded.fetch_add(count, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            validations_ok: self.validations_ok.load(Ordering::Relaxed),
            validations_rejected: self.validations_rejected.load(Ordering::Relaxed),
            serializations_ok: self.serializations_ok.load(Ordering::Relaxed),
            serializations_rejected: self.serializations_rejected.load(Ordering::Relaxed),
            schemas_loaded: self.schemas_loaded.load(Ordering::Relaxed),
        }
    }
}
