//! MySQL backend for the work queue and the aggregate tables.
//!
//! Expected schema (owned by the ingestion pipeline):
//!
//! ```sql
//! CREATE TABLE tiles_to_redraw (
//!     x INT NOT NULL, y INT NOT NULL, z TINYINT NOT NULL,
//!     last_queued TIMESTAMP NOT NULL,
//!     UNIQUE KEY tile (x, y, z)
//! );
//! CREATE TABLE agg_zoom_19 (
//!     x INT NOT NULL, y INT NOT NULL, gtw_id VARCHAR(100) NOT NULL,
//!     samples INT NOT NULL, rssi_max DOUBLE NOT NULL
//! );
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{AggregateCell, AggregateSource, StoreError, TileRedrawRequest, WorkQueueStore};
use crate::config::DatabaseSettings;
use crate::coord::BoundingBox;

/// Table holding the redraw queue.
pub const QUEUE_TABLE: &str = "tiles_to_redraw";

/// Connection pool serving both store traits.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    source_zoom: u8,
    aggregate_table: String,
}

impl MySqlStore {
    /// Connects to the database and verifies the connection with a ping.
    ///
    /// Aggregates are read from `agg_zoom_<source_zoom>`.
    pub async fn connect(settings: &DatabaseSettings, source_zoom: u8) -> Result<Self, StoreError> {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            max_connections = settings.max_connections,
            "Connected to MySQL"
        );

        Ok(Self::from_pool(pool, source_zoom))
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: MySqlPool, source_zoom: u8) -> Self {
        Self {
            pool,
            source_zoom,
            aggregate_table: format!("agg_zoom_{}", source_zoom),
        }
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_error(table: &str, reason: impl Into<String>) -> StoreError {
    StoreError::Decode {
        table: table.to_string(),
        reason: reason.into(),
    }
}

fn redraw_request_from_row(row: &MySqlRow) -> Result<TileRedrawRequest, StoreError> {
    let x: i64 = row.try_get("x")?;
    let y: i64 = row.try_get("y")?;
    let z: i64 = row.try_get("z")?;
    let queued_at: DateTime<Utc> = row.try_get("last_queued")?;

    let zoom = u8::try_from(z).map_err(|_| decode_error(QUEUE_TABLE, format!("zoom {}", z)))?;

    Ok(TileRedrawRequest::new(x, y, zoom, queued_at))
}

fn aggregate_cell_from_row(table: &str, row: &MySqlRow) -> Result<AggregateCell, StoreError> {
    let x: i64 = row.try_get("x")?;
    let y: i64 = row.try_get("y")?;
    let samples: i64 = row.try_get("samples")?;

    Ok(AggregateCell {
        x: u32::try_from(x).map_err(|_| decode_error(table, format!("x = {}", x)))?,
        y: u32::try_from(y).map_err(|_| decode_error(table, format!("y = {}", y)))?,
        gateway_id: row.try_get("gtw_id")?,
        samples: samples.max(0) as u64,
        rssi_max: row.try_get("rssi_max")?,
    })
}

/// `min_age` as a MySQL `INTERVAL .. MICROSECOND` operand, saturating.
fn interval_micros(min_age: Duration) -> u64 {
    u64::try_from(min_age.as_micros()).unwrap_or(u64::MAX)
}

impl WorkQueueStore for MySqlStore {
    async fn claim_next(
        &self,
        min_age: Duration,
        zoom_min: u8,
        zoom_max: u8,
    ) -> Result<Option<TileRedrawRequest>, StoreError> {
        // Ages are compared against the database clock, which is what
        // ingestion uses to stamp last_queued.
        let row = sqlx::query(
            "SELECT x, y, z, last_queued FROM tiles_to_redraw \
             WHERE last_queued < (NOW() - INTERVAL ? MICROSECOND) AND z >= ? AND z <= ? \
             ORDER BY last_queued ASC LIMIT 1",
        )
        .bind(interval_micros(min_age))
        .bind(zoom_min)
        .bind(zoom_max)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(redraw_request_from_row).transpose()
    }

    async fn delete_overlapping(
        &self,
        x: i64,
        y: i64,
        zoom: u8,
        radius: u32,
    ) -> Result<u64, StoreError> {
        let radius = radius as i64;
        let result = sqlx::query(
            "DELETE FROM tiles_to_redraw WHERE x >= ? AND x <= ? AND y >= ? AND y <= ? AND z = ?",
        )
        .bind(x - radius)
        .bind(x + radius)
        .bind(y - radius)
        .bind(y + radius)
        .bind(zoom)
        .execute(&self.pool)
        .await?;

        debug!(x, y, zoom, radius, rows = result.rows_affected(), "Deleted queued tiles");
        Ok(result.rows_affected())
    }

    async fn enqueue(
        &self,
        x: i64,
        y: i64,
        zoom: u8,
        queued_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tiles_to_redraw (x, y, z, last_queued) VALUES (?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE last_queued = LEAST(last_queued, VALUES(last_queued))",
        )
        .bind(x)
        .bind(y)
        .bind(zoom)
        .bind(queued_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pending(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tiles_to_redraw")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

impl AggregateSource for MySqlStore {
    fn source_zoom(&self) -> u8 {
        self.source_zoom
    }

    async fn cells_in(&self, bbox: &BoundingBox) -> Result<Vec<AggregateCell>, StoreError> {
        if bbox.zoom != self.source_zoom {
            return Err(StoreError::Query(format!(
                "{} holds zoom {} cells, bounding box is at zoom {}",
                self.aggregate_table, self.source_zoom, bbox.zoom
            )));
        }

        let sql = format!(
            "SELECT x, y, gtw_id, samples, rssi_max FROM {} \
             WHERE x >= ? AND y >= ? AND x <= ? AND y <= ?",
            self.aggregate_table
        );

        let rows = sqlx::query(&sql)
            .bind(bbox.nw.x)
            .bind(bbox.nw.y)
            .bind(bbox.se.x)
            .bind(bbox.se.y)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| aggregate_cell_from_row(&self.aggregate_table, row))
            .collect()
    }
}
