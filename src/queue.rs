//! Priority-ordered container with delayed eligibility
//!
//! Entries are ordered by (priority descending, insertion sequence ascending)
//! so equal-priority work runs in submission order. An entry whose
//! `eligible_at` lies in the future is retained and skipped until its delay
//! elapses. The structure enforces a bounded capacity and performs the
//! acquire-type-slot-with-dequeue step atomically under its own lock; it
//! carries no other concurrency policy.

use crate::work::{Priority, Work};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Ordering key: highest priority first, then FIFO by insertion sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EntryOrd {
    priority: Reverse<Priority>,
    seq: u64,
}

/// A queued work payload plus the scheduling state the core attaches to it
pub(crate) struct QueueEntry {
    /// Internal id, for logging and events
    pub id: String,
    pub work: Work,
    /// Earliest time this entry may be dispatched
    pub eligible_at: Instant,
}

/// Result of one dequeue attempt
pub(crate) enum TakeOutcome {
    /// An entry was removed and its type slot acquired
    Taken(QueueEntry),
    /// Nothing runnable right now; if entries are merely delayed, reports how
    /// long until the earliest one becomes eligible
    Idle { next_eligible_in: Option<Duration> },
}

struct Inner {
    entries: BTreeMap<EntryOrd, QueueEntry>,
    next_seq: u64,
}

/// Bounded priority queue with per-entry delayed eligibility
pub(crate) struct PriorityDelayQueue {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl PriorityDelayQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: BTreeMap::new(),
                next_seq: 0,
            }),
            capacity,
        }
    }

    /// Insert a payload that becomes eligible after `delay`. Returns `false`
    /// without side effects when the queue is at capacity.
    pub async fn insert(&self, work: Work, delay: Duration) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.entries.len() >= self.capacity {
            return false;
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let ord = EntryOrd {
            priority: Reverse(work.priority()),
            seq,
        };
        inner.entries.insert(
            ord,
            QueueEntry {
                id: Uuid::new_v4().to_string(),
                work,
                eligible_at: Instant::now() + delay,
            },
        );
        true
    }

    /// Remove and return the next dispatchable entry.
    ///
    /// Walks entries in priority order, skipping those whose delay has not
    /// elapsed. `admit` is called for the entry about to be taken and must
    /// atomically claim its type's concurrency slot; when it refuses, strict
    /// head-of-line mode gives up for this round, while next-eligible mode
    /// keeps scanning (up to `scan_limit` eligible entries) for work of a
    /// non-saturated type, leaving the blocked head in place.
    pub async fn take_eligible(
        &self,
        admit: impl Fn(&str) -> bool,
        next_eligible: bool,
        scan_limit: usize,
    ) -> TakeOutcome {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        let mut chosen: Option<EntryOrd> = None;
        let mut next_deadline: Option<Instant> = None;
        let mut scanned = 0usize;

        for (ord, entry) in inner.entries.iter() {
            if entry.eligible_at > now {
                next_deadline = Some(match next_deadline {
                    Some(d) => d.min(entry.eligible_at),
                    None => entry.eligible_at,
                });
                continue;
            }
            scanned += 1;
            if admit(entry.work.work_type()) {
                chosen = Some(*ord);
                break;
            }
            if !next_eligible || scanned >= scan_limit {
                break;
            }
        }

        match chosen {
            Some(ord) => {
                let entry = inner.entries.remove(&ord).expect("chosen entry present");
                TakeOutcome::Taken(entry)
            }
            None => TakeOutcome::Idle {
                next_eligible_in: next_deadline.map(|d| d.saturating_duration_since(now)),
            },
        }
    }

    /// Number of resident entries (queued, not executing)
    pub async fn size(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}
