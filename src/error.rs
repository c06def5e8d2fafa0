//! Error types for the dispatch queue
//!
//! All errors implement the `std::error::Error` trait via `thiserror::Error`.
//!
//! Enqueue-path rejections (queue at capacity, duplicate key, shutdown in
//! progress) are deliberately *not* errors: the facade reports them as a
//! `false` acceptance result and the caller decides whether to retry or drop
//! the work. [`DispatchError`] covers everything else: invalid configuration,
//! drain timeouts, and execution failures surfaced through logs and events.

use thiserror::Error;

/// Dispatch queue error type
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Work item execution error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Operation timed out
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Shutdown in progress
    #[error("Queue is shutting down, not accepting new work")]
    ShutdownInProgress,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result type alias using DispatchError
pub type Result<T> = std::result::Result<T, DispatchError>;
