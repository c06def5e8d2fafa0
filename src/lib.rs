//! # dispatchq
//!
//! An in-process dispatch queue for asynchronously executed work items.
//!
//! - Priority-based scheduling with FIFO order among equal priorities
//! - Delayed execution (an item becomes eligible only after its delay)
//! - Per-type concurrency ceilings with strict or next-eligible dequeue
//! - Key-based de-duplication: one live item per key, duplicates coalesced
//! - Serial chains that execute strictly in order, never concurrently
//! - Bounded capacity, graceful shutdown with drain support
//! - Event system for queue lifecycle notifications
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dispatchq::{DispatchConfig, QueueService, WorkItem, Result};
//! use async_trait::async_trait;
//! use chrono::{DateTime, Utc};
//!
//! struct PurgeCommand {
//!     job_id: String,
//!     created: DateTime<Utc>,
//! }
//!
//! #[async_trait]
//! impl WorkItem for PurgeCommand {
//!     async fn execute(&self) -> Result<serde_json::Value> {
//!         Ok(serde_json::json!({"purged": self.job_id}))
//!     }
//!     fn name(&self) -> &str { "purge" }
//!     fn work_type(&self) -> &str { "purge" }
//!     fn key(&self) -> Option<String> { Some(format!("purge-{}", self.job_id)) }
//!     fn created_time(&self) -> DateTime<Utc> { self.created }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let service = QueueService::new(DispatchConfig::default())?;
//!     service.start().await;
//!
//!     let cmd = PurgeCommand { job_id: "wf-1".into(), created: Utc::now() };
//!     if !service.enqueue(Box::new(cmd)).await {
//!         // queue full, or the same purge is already queued or running
//!     }
//!
//!     service.shutdown().await;
//!     service.drain(std::time::Duration::from_secs(5)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod service;
pub mod work;

mod dispatcher;
mod limiter;
mod queue;
mod uniqueness;

pub use config::DispatchConfig;
pub use error::{DispatchError, Result};
pub use event::{events, DispatchEvent, EventEmitter, EventStream};
pub use metrics::{MetricsSnapshot, QueueMetrics};
pub use service::{QueueService, QueueStats};
pub use work::{Priority, WorkItem};
