//! Queue service facade
//!
//! The single entry point producers use to submit work. A successful enqueue
//! atomically reserves the item's uniqueness key and inserts it into the
//! priority queue; any rejection (capacity, duplicate key, shutdown) leaves no
//! observable side effect and is reported as a `false` acceptance result.
//!
//! # Example
//!
//! ```rust,ignore
//! use dispatchq::{DispatchConfig, QueueService, WorkItem};
//!
//! let service = QueueService::new(DispatchConfig::default())?;
//! service.start().await;
//!
//! let accepted = service.enqueue(Box::new(PurgeCommand::new(job_id))).await;
//! if !accepted {
//!     // queue full, or an identical purge is already in flight
//! }
//! ```

use crate::config::DispatchConfig;
use crate::dispatcher;
use crate::error::{DispatchError, Result};
use crate::event::{events, DispatchEvent, EventEmitter};
use crate::limiter::ConcurrencyLimiter;
use crate::metrics::QueueMetrics;
use crate::queue::PriorityDelayQueue;
use crate::uniqueness::UniquenessTracker;
use crate::work::{SerialChain, Work, WorkItem};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

/// Shared state between the facade and the worker pool
pub(crate) struct QueueCore {
    pub(crate) config: DispatchConfig,
    pub(crate) queue: PriorityDelayQueue,
    pub(crate) tracker: UniquenessTracker,
    pub(crate) limiter: ConcurrencyLimiter,
    pub(crate) emitter: EventEmitter,
    pub(crate) metrics: QueueMetrics,
    pub(crate) wakeup: Notify,
    shutting_down: AtomicBool,
}

impl QueueCore {
    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Shared submission path for producer enqueues and chain continuations.
    ///
    /// Reserves the payload's key, then inserts; a capacity rejection rolls
    /// the reservation back so failed calls leave no trace. Does not check the
    /// shutdown flag: chain continuations must still be admitted while the
    /// queue drains, the facade gates producer calls separately.
    pub(crate) async fn submit(&self, work: Work, delay: Duration) -> bool {
        let name = work.name().to_string();
        let work_type = work.work_type().to_string();
        let priority = work.priority();
        let key = work.key();

        if !self.tracker.try_reserve(key.as_deref()) {
            debug!(name = %name, key = key.as_deref().unwrap_or(""), "duplicate key, submission coalesced");
            self.metrics.record_rejected_duplicate();
            self.emitter.emit(
                DispatchEvent::new(events::ITEM_REJECTED)
                    .field("name", name)
                    .field("reason", "duplicate_key"),
            );
            return false;
        }

        if !self.queue.insert(work, delay).await {
            self.tracker.release(key.as_deref());
            warn!(name = %name, work_type = %work_type, "queue at capacity, submission rejected");
            self.metrics.record_rejected_capacity();
            self.emitter.emit(
                DispatchEvent::new(events::ITEM_REJECTED)
                    .field("name", name)
                    .field("reason", "capacity"),
            );
            return false;
        }

        self.metrics.record_accepted();
        self.emitter.emit(
            DispatchEvent::new(events::ITEM_ACCEPTED)
                .field("name", name)
                .field("work_type", work_type)
                .field("priority", priority)
                .field("delay_ms", delay.as_millis() as u64),
        );
        self.wakeup.notify_one();
        true
    }
}

/// Point-in-time view of queue occupancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    /// Entries resident in the queue, not yet executing
    pub queued: usize,
    /// Items currently executing across all types
    pub in_flight: usize,
    /// De-duplication keys reserved (queued or executing)
    pub reserved_keys: usize,
}

/// The dispatch queue facade
pub struct QueueService {
    core: Arc<QueueCore>,
    workers: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    started: AtomicBool,
}

impl QueueService {
    /// Create a service with its own event emitter
    pub fn new(config: DispatchConfig) -> Result<Self> {
        Self::with_emitter(config, EventEmitter::new(256))
    }

    /// Create a service publishing lifecycle events to the given emitter
    pub fn with_emitter(config: DispatchConfig, emitter: EventEmitter) -> Result<Self> {
        config.validate()?;
        let limiter =
            ConcurrencyLimiter::new(config.concurrency.clone(), config.default_concurrency);
        let queue = PriorityDelayQueue::new(config.capacity);
        Ok(Self {
            core: Arc::new(QueueCore {
                config,
                queue,
                tracker: UniquenessTracker::new(),
                limiter,
                emitter,
                metrics: QueueMetrics::new(),
                wakeup: Notify::new(),
                shutting_down: AtomicBool::new(false),
            }),
            workers: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        })
    }

    /// Start the worker pool. Subsequent calls are no-ops.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(workers = self.core.config.workers, "starting dispatch workers");
        let mut handles = self.workers.lock().await;
        for worker in 0..self.core.config.workers {
            let core = Arc::clone(&self.core);
            handles.push(tokio::spawn(dispatcher::worker_loop(core, worker)));
        }
    }

    /// Submit a work item for immediate execution.
    ///
    /// Returns `false` when the queue is at capacity, the item's key is
    /// already in flight, or the service is shutting down.
    pub async fn enqueue(&self, item: Box<dyn WorkItem>) -> bool {
        self.enqueue_delayed(item, Duration::ZERO).await
    }

    /// Submit a work item that becomes eligible only after `delay`
    pub async fn enqueue_delayed(&self, item: Box<dyn WorkItem>, delay: Duration) -> bool {
        if self.core.is_shutting_down() {
            warn!(name = item.name(), "submission rejected, shutdown in progress");
            return false;
        }
        self.core.submit(Work::Single(Arc::from(item)), delay).await
    }

    /// Submit an ordered chain of work items that must execute strictly in
    /// sequence, never concurrently with each other. Uniqueness and
    /// concurrency gating apply to the chain's current head only; an empty
    /// chain is a vacuous success.
    pub async fn enqueue_serial(&self, items: Vec<Box<dyn WorkItem>>, delay: Duration) -> bool {
        if self.core.is_shutting_down() {
            warn!("chain submission rejected, shutdown in progress");
            return false;
        }
        let items: Vec<Arc<dyn WorkItem>> = items.into_iter().map(Arc::from).collect();
        match SerialChain::new(items, delay) {
            Some(chain) => self.core.submit(Work::Chain(chain), delay).await,
            None => true,
        }
    }

    /// Number of entries resident in the queue (queued, not executing)
    pub async fn queue_size(&self) -> usize {
        self.core.queue.size().await
    }

    /// Number of items currently executing
    pub fn in_flight(&self) -> usize {
        self.core.limiter.total_active()
    }

    /// Occupancy snapshot
    pub async fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.core.queue.size().await,
            in_flight: self.core.limiter.total_active(),
            reserved_keys: self.core.tracker.len(),
        }
    }

    /// Check if shutdown is in progress
    pub fn is_shutting_down(&self) -> bool {
        self.core.is_shutting_down()
    }

    /// Stop accepting new submissions. Already-queued work (including chain
    /// continuations) still runs; workers exit once the queue drains.
    pub async fn shutdown(&self) {
        self.core.shutting_down.store(true, Ordering::SeqCst);
        self.core
            .emitter
            .emit(DispatchEvent::new(events::SHUTDOWN_STARTED));
        self.core.wakeup.notify_waiters();
    }

    /// Wait until no work is queued or executing, up to `timeout`
    pub async fn drain(&self, timeout: Duration) -> Result<()> {
        let start = tokio::time::Instant::now();
        loop {
            if self.core.queue.size().await == 0 && self.core.limiter.total_active() == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(DispatchError::Timeout(timeout));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Get the metrics counters
    pub fn metrics(&self) -> &QueueMetrics {
        &self.core.metrics
    }

    /// Get the lifecycle event emitter
    pub fn events(&self) -> &EventEmitter {
        &self.core.emitter
    }
}
