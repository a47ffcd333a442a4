//! Records exchanged with the work queue and the aggregate tables.

use chrono::{DateTime, Utc};

use crate::coord::{CoordError, TileCoord};

/// A pending obligation to regenerate one output tile.
///
/// `(x, y, zoom)` is the natural key. Indices are kept signed and unchecked
/// until [`TileRedrawRequest::tile`] validates them, since the queue is
/// written by an external ingestion process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRedrawRequest {
    pub x: i64,
    pub y: i64,
    pub zoom: u8,
    /// When the tile was (first) queued
    pub queued_at: DateTime<Utc>,
}

impl TileRedrawRequest {
    pub fn new(x: i64, y: i64, zoom: u8, queued_at: DateTime<Utc>) -> Self {
        Self {
            x,
            y,
            zoom,
            queued_at,
        }
    }

    /// Validates the request's coordinates against the tile grid.
    pub fn tile(&self) -> Result<TileCoord, CoordError> {
        TileCoord::new(self.x, self.y, self.zoom)
    }

    /// Returns the natural key of the request.
    pub fn key(&self) -> (i64, i64, u8) {
        (self.x, self.y, self.zoom)
    }
}

/// Pre-computed statistics for one cell at the fixed source zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCell {
    /// Tile column at the source zoom
    pub x: u32,
    /// Tile row at the source zoom
    pub y: u32,
    /// Gateway that heard the samples in this cell
    pub gateway_id: String,
    /// Number of samples aggregated into the cell
    pub samples: u64,
    /// Strongest received signal in dBm
    pub rssi_max: f64,
}
