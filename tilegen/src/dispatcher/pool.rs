//! Worker tasks, submission handle and shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{DispatchError, DispatcherConfig, JobReport, RenderHandler};
use crate::render::{RenderError, RenderJob};

type SharedReceiver = Arc<Mutex<mpsc::Receiver<RenderJob>>>;

/// Cloneable handle for queueing render jobs.
#[derive(Debug, Clone)]
pub struct JobSubmitter {
    sender: mpsc::Sender<RenderJob>,
}

impl JobSubmitter {
    /// Queues a job, waiting for a free slot if the queue is full.
    pub async fn submit(&self, job: RenderJob) -> Result<(), DispatchError> {
        self.sender.send(job).await.map_err(|_| DispatchError::Closed)
    }

    /// Queues a job only if a slot is free right now.
    pub fn try_submit(&self, job: RenderJob) -> Result<(), DispatchError> {
        self.sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => DispatchError::Full,
            TrySendError::Closed(_) => DispatchError::Closed,
        })
    }

    /// Returns true once the dispatcher has stopped accepting jobs.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Job outcome totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Jobs whose handler returned `Ok`
    pub completed: u64,
    /// Jobs whose handler failed or panicked
    pub failed: u64,
    /// Tiles written across all completed jobs
    pub tiles_written: u64,
    /// Stale tiles removed across all completed jobs
    pub tiles_removed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
    tiles_written: AtomicU64,
    tiles_removed: AtomicU64,
}

impl Counters {
    fn record_success(&self, report: JobReport) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.tiles_written
            .fetch_add(report.written as u64, Ordering::Relaxed);
        self.tiles_removed
            .fetch_add(report.removed as u64, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DispatcherStats {
        DispatcherStats {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            tiles_written: self.tiles_written.load(Ordering::Relaxed),
            tiles_removed: self.tiles_removed.load(Ordering::Relaxed),
        }
    }
}

/// A running pool of render workers.
///
/// Must be started from within a Tokio runtime.
pub struct RenderDispatcher {
    submitter: JobSubmitter,
    shutdown: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl RenderDispatcher {
    /// Spawns the workers. Zero sizes are raised to one.
    pub fn start<H: RenderHandler>(handler: Arc<H>, config: DispatcherConfig) -> Self {
        let workers = config.workers.max(1);
        let capacity = config.queue_capacity.max(1);

        let (sender, receiver) = mpsc::channel(capacity);
        let receiver: SharedReceiver = Arc::new(Mutex::new(receiver));
        let shutdown = CancellationToken::new();
        let counters = Arc::new(Counters::default());

        let handles = (0..workers)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&handler),
                    Arc::clone(&receiver),
                    shutdown.clone(),
                    Arc::clone(&counters),
                ))
            })
            .collect();

        info!(workers, queue_capacity = capacity, "Render dispatcher started");

        Self {
            submitter: JobSubmitter { sender },
            shutdown,
            workers: handles,
            counters,
        }
    }

    /// Returns a handle for queueing jobs.
    pub fn submitter(&self) -> JobSubmitter {
        self.submitter.clone()
    }

    /// Returns the totals so far.
    pub fn stats(&self) -> DispatcherStats {
        self.counters.snapshot()
    }

    /// Stops accepting jobs, finishes everything already queued and waits
    /// for the workers to exit.
    pub async fn shutdown(self) -> DispatcherStats {
        let RenderDispatcher {
            submitter,
            shutdown,
            workers,
            counters,
        } = self;

        drop(submitter);
        shutdown.cancel();

        for handle in workers {
            if let Err(e) = handle.await {
                error!(error = %e, "Render worker task failed");
            }
        }

        let stats = counters.snapshot();
        info!(
            completed = stats.completed,
            failed = stats.failed,
            tiles_written = stats.tiles_written,
            tiles_removed = stats.tiles_removed,
            "Render dispatcher stopped"
        );
        stats
    }
}

/// Takes the next job, or `None` once shut down and drained.
async fn next_job(receiver: &SharedReceiver, shutdown: &CancellationToken) -> Option<RenderJob> {
    let mut receiver = receiver.lock().await;
    tokio::select! {
        biased;

        job = receiver.recv() => job,

        _ = shutdown.cancelled() => {
            // Closing rejects new submissions but keeps buffered jobs
            receiver.close();
            receiver.recv().await
        }
    }
}

async fn worker_loop<H: RenderHandler>(
    id: usize,
    handler: Arc<H>,
    receiver: SharedReceiver,
    shutdown: CancellationToken,
    counters: Arc<Counters>,
) {
    debug!(worker = id, "Render worker started");

    while let Some(job) = next_job(&receiver, &shutdown).await {
        let tile = job.tile;
        let cells = job.cells.len();
        let handler = Arc::clone(&handler);

        match tokio::task::spawn_blocking(move || handler.handle(&job)).await {
            Ok(Ok(report)) => {
                counters.record_success(report);
                debug!(
                    worker = id,
                    tile = %tile,
                    cells,
                    written = report.written,
                    removed = report.removed,
                    "Render job complete"
                );
            }
            Ok(Err(e)) => {
                counters.record_failure();
                warn!(worker = id, tile = %tile, error = %e, "Render job failed");
            }
            Err(join_error) if join_error.is_panic() => {
                counters.record_failure();
                let err = RenderError::Panicked(tile);
                error!(worker = id, error = %err, "Render job panicked");
            }
            Err(join_error) => {
                counters.record_failure();
                error!(worker = id, tile = %tile, error = %join_error, "Render job cancelled");
            }
        }
    }

    debug!(worker = id, "Render worker stopped");
}
