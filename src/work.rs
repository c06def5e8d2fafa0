//! Work item contract between producers and the dispatcher
//!
//! Producers hand the queue any type implementing [`WorkItem`]; the core never
//! looks inside `execute()`. A work item carries a `work_type` used only for
//! per-type concurrency throttling, a `priority` (higher = more urgent), and
//! an optional `key` used for at-most-one-in-flight de-duplication.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Work item priority (higher number = more urgent)
pub type Priority = i32;

/// A unit of schedulable work
#[async_trait]
pub trait WorkItem: Send + Sync {
    /// Execute the work item
    async fn execute(&self) -> Result<serde_json::Value>;

    /// Get item name (for logging/debugging)
    fn name(&self) -> &str;

    /// Get work type, used to bound concurrent execution per category
    fn work_type(&self) -> &str;

    /// Get priority; items of equal priority execute in submission order
    fn priority(&self) -> Priority {
        0
    }

    /// Logical de-duplication key. At most one item per key may be queued or
    /// executing at a time; `None` (or an empty string) bypasses uniqueness
    /// and every submission is distinct.
    fn key(&self) -> Option<String> {
        None
    }

    /// Creation timestamp, for diagnostics only
    fn created_time(&self) -> DateTime<Utc>;
}

/// An ordered chain of work items that must execute strictly in sequence.
///
/// Only the head is ever queued or executing; when it completes the dispatcher
/// re-submits the remainder through the regular enqueue path, carrying the
/// chain's original delay. The chain's visible key, type and priority are
/// always those of the current head.
pub(crate) struct SerialChain {
    pub(crate) items: VecDeque<Arc<dyn WorkItem>>,
    pub(crate) delay: Duration,
}

impl SerialChain {
    pub(crate) fn new(items: Vec<Arc<dyn WorkItem>>, delay: Duration) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(Self {
            items: items.into(),
            delay,
        })
    }

    pub(crate) fn head(&self) -> &Arc<dyn WorkItem> {
        // non-empty by construction
        &self.items[0]
    }

    /// Split off the head, leaving the remainder (possibly empty)
    pub(crate) fn pop_head(mut self) -> (Arc<dyn WorkItem>, Option<SerialChain>) {
        let head = self.items.pop_front().expect("chain is never empty");
        let rest = if self.items.is_empty() {
            None
        } else {
            Some(self)
        };
        (head, rest)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

/// Queued payload: a standalone item or the head-of-the-moment of a chain
pub(crate) enum Work {
    Single(Arc<dyn WorkItem>),
    Chain(SerialChain),
}

impl Work {
    /// The item that will actually run when this payload is dispatched
    pub(crate) fn head(&self) -> &Arc<dyn WorkItem> {
        match self {
            Work::Single(item) => item,
            Work::Chain(chain) => chain.head(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.head().name()
    }

    pub(crate) fn work_type(&self) -> &str {
        self.head().work_type()
    }

    pub(crate) fn priority(&self) -> Priority {
        self.head().priority()
    }

    /// Normalized key: empty strings collapse to `None`
    pub(crate) fn key(&self) -> Option<String> {
        self.head().key().filter(|k| !k.is_empty())
    }
}
