//! Dispatch queue configuration

use crate::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Dispatch queue configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// Number of worker tasks pulling from the queue
    pub workers: usize,
    /// Maximum number of queued entries; enqueues beyond this are rejected
    pub capacity: usize,
    /// Concurrency ceiling applied to work types not listed in `concurrency`
    pub default_concurrency: usize,
    /// Per-type concurrency ceilings
    #[serde(default)]
    pub concurrency: HashMap<String, usize>,
    /// When true, a worker whose head-of-queue type is saturated scans forward
    /// for the first eligible entry of a non-saturated type instead of waiting
    #[serde(default)]
    pub next_eligible: bool,
    /// How long an idle worker waits before re-checking delayed entries
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
    /// Upper bound on how many eligible entries a next-eligible scan inspects
    /// before giving up for the round
    pub scan_limit: usize,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            capacity: 10_000,
            default_concurrency: 3,
            concurrency: HashMap::new(),
            next_eligible: false,
            poll_interval: Duration::from_millis(100),
            scan_limit: 100,
        }
    }
}

impl DispatchConfig {
    /// Create a configuration with the given worker count and queue capacity
    pub fn new(workers: usize, capacity: usize) -> Self {
        Self {
            workers,
            capacity,
            ..Self::default()
        }
    }

    /// Set the default per-type concurrency ceiling (builder pattern)
    pub fn with_default_concurrency(mut self, ceiling: usize) -> Self {
        self.default_concurrency = ceiling;
        self
    }

    /// Set the concurrency ceiling for one work type (builder pattern)
    pub fn with_type_concurrency(mut self, work_type: impl Into<String>, ceiling: usize) -> Self {
        self.concurrency.insert(work_type.into(), ceiling);
        self
    }

    /// Enable or disable next-eligible scanning (builder pattern)
    pub fn with_next_eligible(mut self, enabled: bool) -> Self {
        self.next_eligible = enabled;
        self
    }

    /// Set the idle poll interval (builder pattern)
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the next-eligible scan bound (builder pattern)
    pub fn with_scan_limit(mut self, scan_limit: usize) -> Self {
        self.scan_limit = scan_limit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(DispatchError::Config("workers must be > 0".to_string()));
        }
        if self.capacity == 0 {
            return Err(DispatchError::Config("capacity must be > 0".to_string()));
        }
        if self.default_concurrency == 0 {
            return Err(DispatchError::Config(
                "default_concurrency must be > 0".to_string(),
            ));
        }
        if let Some((work_type, _)) = self.concurrency.iter().find(|(_, c)| **c == 0) {
            return Err(DispatchError::Config(format!(
                "concurrency ceiling for type '{}' must be > 0",
                work_type
            )));
        }
        if self.scan_limit == 0 {
            return Err(DispatchError::Config("scan_limit must be > 0".to_string()));
        }
        Ok(())
    }
}
