//! Queue metrics
//!
//! Lightweight atomic counters owned by the service, for observability only.
//! Execution failures never propagate to producers, so these counters (with
//! the event stream) are the only place rejections and failures are visible.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Counters {
    accepted: AtomicU64,
    rejected_capacity: AtomicU64,
    rejected_duplicate: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
}

/// Counter set for queue activity
#[derive(Clone, Default)]
pub struct QueueMetrics {
    counters: Arc<Counters>,
}

/// Point-in-time view of the metrics counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Submissions admitted into the queue
    pub accepted: u64,
    /// Submissions rejected because the queue was full
    pub rejected_capacity: u64,
    /// Submissions coalesced away because their key was already in flight
    pub rejected_duplicate: u64,
    /// Items whose `execute()` returned, successfully or not
    pub executed: u64,
    /// Items whose `execute()` returned an error or panicked
    pub failed: u64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.counters.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_capacity(&self) {
        self.counters
            .rejected_capacity
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_duplicate(&self) {
        self.counters
            .rejected_duplicate
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_executed(&self) {
        self.counters.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Export current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            rejected_capacity: self.counters.rejected_capacity.load(Ordering::Relaxed),
            rejected_duplicate: self.counters.rejected_duplicate.load(Ordering::Relaxed),
            executed: self.counters.executed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}
