//! Per-type concurrency accounting
//!
//! Bounds how many items of each work type may execute at once. The limiter is
//! advisory: it is honest only as long as every worker pairs `try_acquire`
//! with exactly one `release`. It is passed to workers explicitly rather than
//! living in a process-wide singleton.

use std::collections::HashMap;

use dashmap::DashMap;

/// Per-work-type active-execution counter with configurable ceilings
pub struct ConcurrencyLimiter {
    active: DashMap<String, usize>,
    ceilings: HashMap<String, usize>,
    default_ceiling: usize,
}

impl ConcurrencyLimiter {
    /// Create a limiter with per-type ceilings and a default for unlisted types
    pub fn new(ceilings: HashMap<String, usize>, default_ceiling: usize) -> Self {
        Self {
            active: DashMap::new(),
            ceilings,
            default_ceiling,
        }
    }

    /// Ceiling that applies to the given work type
    pub fn ceiling(&self, work_type: &str) -> usize {
        self.ceilings
            .get(work_type)
            .copied()
            .unwrap_or(self.default_ceiling)
    }

    /// Try to claim an execution slot for the type. The entry guard holds the
    /// map shard lock, making test-and-increment atomic.
    pub fn try_acquire(&self, work_type: &str) -> bool {
        let ceiling = self.ceiling(work_type);
        let mut count = self.active.entry(work_type.to_string()).or_insert(0);
        if *count < ceiling {
            *count += 1;
            true
        } else {
            false
        }
    }

    /// Return an execution slot. Must be called exactly once per successful
    /// `try_acquire`, after the item finished executing.
    pub fn release(&self, work_type: &str) {
        if let Some(mut count) = self.active.get_mut(work_type) {
            *count = count.saturating_sub(1);
        }
    }

    /// Currently active executions for the type (introspection)
    pub fn active(&self, work_type: &str) -> usize {
        self.active.get(work_type).map(|c| *c).unwrap_or(0)
    }

    /// Total active executions across all types
    pub fn total_active(&self) -> usize {
        self.active.iter().map(|e| *e.value()).sum()
    }
}
