//! Persistence seams for the reprocessing loop.
//!
//! Two traits describe everything the coordinator needs from the database:
//!
//! - [`WorkQueueStore`] - the shared table of tiles waiting to be redrawn
//! - [`AggregateSource`] - read-only access to aggregated cells at the
//!   fixed source zoom
//!
//! [`MySqlStore`] is the production backend for both. The in-memory
//! implementations back the tests and the `--memory` dry-run mode.
//!
//! # Queue semantics
//!
//! `claim_next` never deletes. The coordinator deletes explicitly afterwards,
//! so a crash between the two leaves the entry claimable again
//! (at-least-once reprocessing). Inserting an `(x, y, zoom)` that is already
//! queued keeps the older timestamp.

mod memory;
mod mysql;
mod types;

pub use memory::{MemoryAggregateSource, MemoryQueueStore};
pub use mysql::{MySqlStore, QUEUE_TABLE};
pub use types::{AggregateCell, TileRedrawRequest};

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::coord::BoundingBox;

/// Errors from the work queue or aggregate queries.
///
/// All variants are transient from the coordinator's point of view: the
/// cycle is abandoned and retried on the next poll.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// A statement failed to execute
    #[error("Store query failed: {0}")]
    Query(String),

    /// A row could not be converted into a record
    #[error("Invalid row in {table}: {reason}")]
    Decode { table: String, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Connection(err.to_string()),
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => StoreError::Decode {
                table: "unknown".to_string(),
                reason: err.to_string(),
            },
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// The durable queue of tiles waiting to be redrawn.
pub trait WorkQueueStore: Send + Sync + 'static {
    /// Returns the oldest request queued more than `min_age` ago whose zoom
    /// lies in `zoom_min..=zoom_max`, without removing it.
    fn claim_next(
        &self,
        min_age: Duration,
        zoom_min: u8,
        zoom_max: u8,
    ) -> impl Future<Output = Result<Option<TileRedrawRequest>, StoreError>> + Send;

    /// Removes every request at `zoom` within `radius` tiles of `(x, y)` on
    /// both axes (inclusive). Returns the number of requests removed.
    fn delete_overlapping(
        &self,
        x: i64,
        y: i64,
        zoom: u8,
        radius: u32,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Queues a tile, merging with an existing entry by keeping the older
    /// timestamp.
    fn enqueue(
        &self,
        x: i64,
        y: i64,
        zoom: u8,
        queued_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns the number of queued requests.
    fn pending(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// Read-only access to aggregated cells.
pub trait AggregateSource: Send + Sync + 'static {
    /// The zoom level cells are stored at.
    fn source_zoom(&self) -> u8;

    /// Returns every cell whose index lies inside `bbox` (inclusive).
    ///
    /// `bbox` must be expressed at [`AggregateSource::source_zoom`].
    fn cells_in(
        &self,
        bbox: &BoundingBox,
    ) -> impl Future<Output = Result<Vec<AggregateCell>, StoreError>> + Send;
}
