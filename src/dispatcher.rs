//! Worker pool pulling eligible entries from the queue
//!
//! Each worker runs an endless loop: select the next dispatchable entry
//! (claiming its type's concurrency slot during selection, so dequeue and
//! admission are one atomic step), execute it, then unwind the bookkeeping.
//! The cleanup path always runs, success or failure, in a fixed order:
//! submit the chain continuation, release the type slot, release the
//! uniqueness key. Submitting the continuation while the head's key is still
//! reserved is what coalesces away a same-key chain remainder.

use crate::event::{events, DispatchEvent};
use crate::queue::{QueueEntry, TakeOutcome};
use crate::service::QueueCore;
use crate::work::Work;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Worker loop body. Runs until shutdown is requested and the queue drains.
pub(crate) async fn worker_loop(core: Arc<QueueCore>, worker: usize) {
    debug!(worker, "dispatch worker started");
    loop {
        let outcome = core
            .queue
            .take_eligible(
                |work_type| core.limiter.try_acquire(work_type),
                core.config.next_eligible,
                core.config.scan_limit,
            )
            .await;

        match outcome {
            TakeOutcome::Taken(entry) => {
                run_entry(&core, entry).await;
                // A slot was freed; a blocked peer may be runnable now.
                core.wakeup.notify_one();
            }
            TakeOutcome::Idle { next_eligible_in } => {
                if core.is_shutting_down() && core.queue.size().await == 0 {
                    break;
                }
                let wait = next_eligible_in
                    .map(|d| d.min(core.config.poll_interval))
                    .unwrap_or(core.config.poll_interval);
                tokio::select! {
                    _ = core.wakeup.notified() => {}
                    _ = tokio::time::sleep(wait) => {}
                }
            }
        }
    }
    debug!(worker, "dispatch worker stopped");
}

/// Execute one dequeued entry and unwind limiter/uniqueness/chain state.
///
/// The entry's type slot is already held by the caller.
async fn run_entry(core: &Arc<QueueCore>, entry: QueueEntry) {
    let (item, continuation) = match entry.work {
        Work::Single(item) => (item, None),
        Work::Chain(chain) => {
            let (head, rest) = chain.pop_head();
            (head, rest)
        }
    };

    let name = item.name().to_string();
    let work_type = item.work_type().to_string();
    let key = item.key().filter(|k| !k.is_empty());

    debug!(id = %entry.id, name = %name, work_type = %work_type, "executing work item");
    core.emitter.emit(
        DispatchEvent::new(events::ITEM_STARTED)
            .field("id", entry.id.clone())
            .field("name", name.clone())
            .field("work_type", work_type.clone()),
    );

    // Run the item on its own task so a panicking `execute` cannot take the
    // worker down; the join result distinguishes panic from error.
    let exec = {
        let item = Arc::clone(&item);
        tokio::spawn(async move { item.execute().await })
    };
    let result = exec.await;
    core.metrics.record_executed();

    match result {
        Ok(Ok(_)) => {
            core.emitter.emit(
                DispatchEvent::new(events::ITEM_COMPLETED)
                    .field("id", entry.id.clone())
                    .field("name", name.clone()),
            );
        }
        Ok(Err(err)) => {
            core.metrics.record_failed();
            warn!(
                id = %entry.id,
                name = %name,
                work_type = %work_type,
                key = key.as_deref().unwrap_or(""),
                error = %err,
                "work item failed"
            );
            core.emitter.emit(
                DispatchEvent::new(events::ITEM_FAILED)
                    .field("id", entry.id.clone())
                    .field("name", name.clone())
                    .field("work_type", work_type.clone())
                    .field("error", err.to_string()),
            );
        }
        Err(join_err) => {
            core.metrics.record_failed();
            error!(
                id = %entry.id,
                name = %name,
                work_type = %work_type,
                key = key.as_deref().unwrap_or(""),
                "work item panicked: {join_err}"
            );
            core.emitter.emit(
                DispatchEvent::new(events::ITEM_FAILED)
                    .field("id", entry.id.clone())
                    .field("name", name.clone())
                    .field("work_type", work_type.clone())
                    .field("error", "panic"),
            );
        }
    }

    // Chain remainder re-enters the regular submission path with the chain's
    // original delay. A head failure does not abort the chain. The head's key
    // is still reserved here, so a remainder sharing it is dropped as a
    // duplicate.
    if let Some(rest) = continuation {
        let delay = rest.delay;
        let remaining = rest.len();
        if core.submit(Work::Chain(rest), delay).await {
            core.emitter.emit(
                DispatchEvent::new(events::CHAIN_CONTINUED)
                    .field("after", name.clone())
                    .field("remaining", remaining),
            );
        }
    }

    core.limiter.release(&work_type);
    core.tracker.release(key.as_deref());
}
