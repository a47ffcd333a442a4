//! Enqueue command - queue a tile for redrawing.

use std::path::Path;

use chrono::Utc;
use tilegen::coord::TileCoord;
use tilegen::store::{MySqlStore, WorkQueueStore};

use crate::error::CliError;
use crate::runner::{load_config, runtime};

/// Validates the tile, then inserts or merges it into the work queue.
pub fn run(config: Option<&Path>, zoom: u8, x: i64, y: i64) -> Result<(), CliError> {
    let tile = TileCoord::new(x, y, zoom)?;
    let config = load_config(config)?;

    let pending = runtime()?.block_on(async {
        let store = MySqlStore::connect(&config.database, config.coordinator.source_zoom).await?;
        store
            .enqueue(tile.x as i64, tile.y as i64, tile.zoom, Utc::now())
            .await?;
        let pending = store.pending().await;
        store.close().await;
        pending
    })?;

    println!("Queued tile {} ({} pending)", tile, pending);
    Ok(())
}
