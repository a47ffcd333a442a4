//! Coordinator states, cycle outcomes and counters.

use std::fmt;
use std::time::Duration;

use crate::coord::{BoundingBox, CoordError, TileCoord};
use crate::store::{StoreError, TileRedrawRequest};

/// Where the coordinator is within a cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CoordinatorState {
    /// Between cycles, or waiting for the next poll
    #[default]
    Idle,
    /// A request was returned by the queue and is being validated
    Claimed(TileRedrawRequest),
    /// Overlapping requests are purged; aggregates are being fetched
    Fetching { tile: TileCoord, bbox: BoundingBox },
    /// Render jobs are being handed to the dispatcher
    Dispatching { tile: TileCoord, cells: usize },
}

/// The step of a cycle that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Claim,
    Purge,
    Fetch,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CyclePhase::Claim => "claim",
            CyclePhase::Purge => "purge",
            CyclePhase::Fetch => "fetch",
        })
    }
}

/// Wall time spent in each phase of a rendered cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    pub claim: Duration,
    pub purge: Duration,
    pub fetch: Duration,
    pub dispatch: Duration,
    pub total: Duration,
}

/// Result of one coordinator cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Nothing was eligible
    Idle,
    /// The claimed tile and its neighbours were handed to the dispatcher
    Rendered {
        tile: TileCoord,
        /// Queue entries removed by the neighbour purge
        purged: u64,
        jobs: usize,
        cells: usize,
        timings: PhaseTimings,
    },
    /// The claimed request was invalid and has been dropped
    Skipped {
        request: TileRedrawRequest,
        error: CoordError,
    },
    /// A store call failed; the cycle was abandoned
    Aborted { phase: CyclePhase, error: StoreError },
}

/// Totals over the lifetime of a coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub cycles: u64,
    pub idle_polls: u64,
    pub tiles_rendered: u64,
    pub jobs_submitted: u64,
    pub requests_purged: u64,
    pub skipped: u64,
    pub aborted: u64,
}

impl CoordinatorStats {
    pub(super) fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::Idle => self.idle_polls += 1,
            CycleOutcome::Rendered { purged, jobs, .. } => {
                self.tiles_rendered += 1;
                self.jobs_submitted += *jobs as u64;
                self.requests_purged += purged;
            }
            CycleOutcome::Skipped { .. } => self.skipped += 1,
            CycleOutcome::Aborted { .. } => self.aborted += 1,
        }
    }
}
