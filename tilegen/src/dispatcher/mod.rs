//! Bounded pool of render workers.
//!
//! The coordinator hands [`RenderJob`]s to a [`JobSubmitter`]; a fixed number
//! of workers pull them from a shared bounded channel and run a
//! [`RenderHandler`] for each on the blocking thread pool.
//!
//! # Guarantees
//!
//! - Every accepted job is handled exactly once.
//! - At most `workers` jobs run at the same time.
//! - Submitting waits while the queue is full, so a slow disk slows the
//!   coordinator down instead of growing memory.
//! - A job that fails or panics is logged and counted; its worker moves on.
//!
//! # Example
//!
//! ```ignore
//! let dispatcher = RenderDispatcher::start(Arc::new(pipeline), DispatcherConfig::default());
//! dispatcher.submitter().submit(job).await?;
//! let stats = dispatcher.shutdown().await;
//! ```

mod pool;

pub use pool::{DispatcherStats, JobSubmitter, RenderDispatcher};

use thiserror::Error;

use crate::config::{default_queue_capacity, DispatcherSettings, DEFAULT_WORKERS};
use crate::render::{RenderError, RenderJob};

/// Work done for one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Tiles written
    pub written: usize,
    /// Stale tiles deleted because the renderer had nothing to draw
    pub removed: usize,
}

/// Executes one render job to completion.
///
/// Called from a blocking thread; implementations may do file I/O directly.
pub trait RenderHandler: Send + Sync + 'static {
    fn handle(&self, job: &RenderJob) -> Result<JobReport, RenderError>;
}

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: default_queue_capacity(DEFAULT_WORKERS),
        }
    }
}

impl From<&DispatcherSettings> for DispatcherConfig {
    fn from(settings: &DispatcherSettings) -> Self {
        Self {
            workers: settings.workers,
            queue_capacity: settings.queue_capacity,
        }
    }
}

/// Errors returned to submitters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The dispatcher has shut down and accepts no more jobs
    #[error("Render dispatcher is closed")]
    Closed,

    /// The queue is full (non-waiting submission only)
    #[error("Render queue is full")]
    Full,
}
