//! The tile reprocessing loop.
//!
//! Each cycle claims the oldest eligible redraw request, purges the queue
//! entries its redraw makes redundant, fetches the aggregate cells around it
//! and hands one render job per tile of the surrounding 3×3 grid to the
//! dispatcher:
//!
//! ```text
//! claim ─► validate ─► purge (radius 1) ─► fetch (pad 2) ─► dispatch 3×3
//!   │          │
//!   │          └─ out of range: delete request, skip
//!   └─ nothing eligible: sleep poll_interval
//! ```
//!
//! Store errors abandon the cycle and the loop carries on after the poll
//! interval. Only a closed dispatcher or cancellation ends [`Coordinator::run`].

mod state;

pub use state::{CoordinatorState, CoordinatorStats, CycleOutcome, CyclePhase, PhaseTimings};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::CoordinatorSettings;
use crate::coord::{padded_bounds, TileCoord};
use crate::dispatcher::{DispatchError, JobSubmitter};
use crate::render::RenderJob;
use crate::store::{AggregateCell, AggregateSource, StoreError, TileRedrawRequest, WorkQueueStore};

/// Neighbourhood redrawn with every claimed tile, in tiles.
pub const NEIGHBOUR_RADIUS: u32 = 1;

/// Padding of the aggregate fetch around the claimed tile, in tiles.
///
/// Every redrawn neighbour needs its own one-tile margin.
pub const FETCH_PADDING: u32 = NEIGHBOUR_RADIUS + 1;

/// Drives the work queue through the render dispatcher.
pub struct Coordinator<Q, A> {
    queue: Arc<Q>,
    aggregates: Arc<A>,
    submitter: JobSubmitter,
    poll_interval: Duration,
    min_queue_age: Duration,
    min_zoom: u8,
    max_zoom: u8,
    state: CoordinatorState,
    stats: CoordinatorStats,
}

impl<Q: WorkQueueStore, A: AggregateSource> Coordinator<Q, A> {
    /// Creates a coordinator. Cells are fetched at the aggregate source's
    /// own zoom level.
    pub fn new(
        settings: &CoordinatorSettings,
        queue: Arc<Q>,
        aggregates: Arc<A>,
        submitter: JobSubmitter,
    ) -> Self {
        if aggregates.source_zoom() != settings.source_zoom {
            warn!(
                configured = settings.source_zoom,
                source = aggregates.source_zoom(),
                "Aggregate source zoom differs from configuration, using the source's"
            );
        }

        Self {
            queue,
            aggregates,
            submitter,
            poll_interval: settings.poll_interval,
            min_queue_age: settings.min_queue_age,
            min_zoom: settings.min_zoom,
            max_zoom: settings.max_zoom,
            state: CoordinatorState::Idle,
            stats: CoordinatorStats::default(),
        }
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    /// Runs cycles until `shutdown` is cancelled or the dispatcher closes.
    ///
    /// Cancellation is observed between cycles and while idle, never in the
    /// middle of a cycle.
    pub async fn run(mut self, shutdown: CancellationToken) -> CoordinatorStats {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            min_queue_age_ms = self.min_queue_age.as_millis() as u64,
            min_zoom = self.min_zoom,
            max_zoom = self.max_zoom,
            source_zoom = self.aggregates.source_zoom(),
            "Coordinator starting"
        );

        match self.queue.pending().await {
            Ok(pending) => info!(pending, "Work queue depth"),
            Err(e) => warn!(error = %e, "Could not read work queue depth"),
        }

        while !shutdown.is_cancelled() {
            let outcome = match self.run_cycle().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "Dispatcher unavailable, stopping coordinator");
                    break;
                }
            };

            let idle = matches!(
                outcome,
                CycleOutcome::Idle | CycleOutcome::Aborted { .. }
            );
            if idle {
                tokio::select! {
                    biased;

                    _ = shutdown.cancelled() => break,

                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            } else {
                // A store that never suspends must not starve the runtime.
                tokio::task::yield_now().await;
            }
        }

        self.state = CoordinatorState::Idle;
        info!(
            cycles = self.stats.cycles,
            tiles_rendered = self.stats.tiles_rendered,
            jobs_submitted = self.stats.jobs_submitted,
            skipped = self.stats.skipped,
            aborted = self.stats.aborted,
            "Coordinator stopped"
        );
        self.stats
    }

    /// Runs a single cycle.
    ///
    /// Only a closed dispatcher is returned as an error; every other failure
    /// is reported through the outcome.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, DispatchError> {
        let outcome = self.cycle().await;
        self.state = CoordinatorState::Idle;
        if let Ok(outcome) = &outcome {
            self.stats.record(outcome);
        }
        outcome
    }

    async fn cycle(&mut self) -> Result<CycleOutcome, DispatchError> {
        let started = Instant::now();
        let mut timings = PhaseTimings::default();

        let claimed = match self
            .queue
            .claim_next(self.min_queue_age, self.min_zoom, self.max_zoom)
            .await
        {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("No tiles eligible for redraw");
                return Ok(CycleOutcome::Idle);
            }
            Err(e) => return Ok(aborted(CyclePhase::Claim, e)),
        };
        timings.claim = started.elapsed();
        self.state = CoordinatorState::Claimed(claimed.clone());

        let tile = match claimed.tile() {
            Ok(tile) => tile,
            Err(error) => {
                warn!(
                    x = claimed.x,
                    y = claimed.y,
                    zoom = claimed.zoom,
                    error = %error,
                    "Dropping invalid redraw request"
                );
                if let Err(e) = self
                    .queue
                    .delete_overlapping(claimed.x, claimed.y, claimed.zoom, 0)
                    .await
                {
                    return Ok(aborted(CyclePhase::Purge, e));
                }
                return Ok(CycleOutcome::Skipped {
                    request: claimed,
                    error,
                });
            }
        };

        let source_zoom = self.aggregates.source_zoom();
        let bbox = match padded_bounds(&tile, FETCH_PADDING, source_zoom) {
            Ok(bbox) => bbox,
            Err(error) => {
                warn!(tile = %tile, source_zoom, error = %error, "Cannot project tile to source zoom, dropping request");
                if let Err(e) = self
                    .queue
                    .delete_overlapping(claimed.x, claimed.y, claimed.zoom, 0)
                    .await
                {
                    return Ok(aborted(CyclePhase::Purge, e));
                }
                return Ok(CycleOutcome::Skipped {
                    request: claimed,
                    error,
                });
            }
        };

        // Purge first: anything queued from here on is newer than the data
        // about to be read and stays queued.
        let phase = Instant::now();
        let purged = match self
            .queue
            .delete_overlapping(claimed.x, claimed.y, claimed.zoom, NEIGHBOUR_RADIUS)
            .await
        {
            Ok(purged) => purged,
            Err(e) => return Ok(aborted(CyclePhase::Purge, e)),
        };
        timings.purge = phase.elapsed();

        self.state = CoordinatorState::Fetching { tile, bbox };
        let phase = Instant::now();
        let cells = match self.aggregates.cells_in(&bbox).await {
            Ok(cells) => cells,
            Err(e) => {
                self.requeue(&claimed).await;
                return Ok(aborted(CyclePhase::Fetch, e));
            }
        };
        timings.fetch = phase.elapsed();

        let cell_count = cells.len();
        self.state = CoordinatorState::Dispatching {
            tile,
            cells: cell_count,
        };
        let phase = Instant::now();
        let jobs = build_jobs(&tile, source_zoom, &cells);
        let job_count = jobs.len();
        for job in jobs {
            self.submitter.submit(job).await?;
        }
        timings.dispatch = phase.elapsed();
        timings.total = started.elapsed();

        info!(
            tile = %tile,
            purged,
            cells = cell_count,
            jobs = job_count,
            claim_ms = timings.claim.as_millis() as u64,
            purge_ms = timings.purge.as_millis() as u64,
            fetch_ms = timings.fetch.as_millis() as u64,
            dispatch_ms = timings.dispatch.as_millis() as u64,
            total_ms = timings.total.as_millis() as u64,
            "Tile dispatched"
        );

        Ok(CycleOutcome::Rendered {
            tile,
            purged,
            jobs: job_count,
            cells: cell_count,
            timings,
        })
    }

    /// Puts a purged request back after a failed fetch, keeping its
    /// original timestamp.
    async fn requeue(&self, request: &TileRedrawRequest) {
        if let Err(e) = self
            .queue
            .enqueue(request.x, request.y, request.zoom, request.queued_at)
            .await
        {
            error!(
                x = request.x,
                y = request.y,
                zoom = request.zoom,
                error = %e,
                "Failed to requeue tile after fetch error"
            );
        }
    }
}

fn aborted(phase: CyclePhase, error: StoreError) -> CycleOutcome {
    warn!(phase = %phase, error = %error, "Cycle aborted");
    CycleOutcome::Aborted { phase, error }
}

/// One job per tile of the 3×3 grid around `tile`, each holding the cells
/// inside its own one-tile margin.
pub fn build_jobs(tile: &TileCoord, source_zoom: u8, cells: &[AggregateCell]) -> Vec<RenderJob> {
    let grid = match padded_bounds(tile, NEIGHBOUR_RADIUS, tile.zoom) {
        Ok(grid) => grid,
        Err(_) => return Vec::new(),
    };

    grid.tiles()
        .filter_map(|neighbour| {
            let window = padded_bounds(&neighbour, 1, source_zoom).ok()?;
            let cells = cells
                .iter()
                .filter(|cell| window.contains(cell.x, cell.y))
                .cloned()
                .collect();
            Some(RenderJob::new(neighbour, source_zoom, cells))
        })
        .collect()
}
