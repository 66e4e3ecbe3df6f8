//! Structured failure taxonomy
//!
//! Every failure a run can hit is rejected or surfaced as one of these
//! variants; nothing is retried. The coordinator wraps them with per-worker
//! context on the way out, but callers can always downcast to the variant.

use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by the filtering pipeline
#[derive(Debug, Error)]
pub enum FilterError {
    /// Kernel is not square or has an even side length.
    ///
    /// Rejected before any work starts.
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// Partition request cannot produce non-empty bands.
    ///
    /// Raised when worker_count < 1 or height < worker_count.
    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    /// Send/receive to a worker failed. Fatal to the run; partial results
    /// are discarded.
    #[error("transport failure on worker {worker}: {message}")]
    Transport { worker: usize, message: String },

    /// Source image could not be decoded. No filtering is attempted.
    #[error("failed to decode image")]
    Decode(#[from] image::ImageError),

    /// Deadline expired while waiting on a worker.
    #[error("deadline of {0:?} exceeded waiting on worker {1}")]
    Cancelled(Duration, usize),

    /// Distributed run requested with no reachable workers.
    #[error("no workers available")]
    NoWorkersAvailable,
}
