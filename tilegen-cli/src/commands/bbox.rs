//! Bbox command - show the aggregate region fetched for a tile.

use std::path::Path;

use tilegen::coord::{padded_bounding_box_at_zoom, tile_to_lat_lon, BoundingBox, TileCoord};

use crate::error::CliError;
use crate::runner::load_config;

pub fn run(
    config: Option<&Path>,
    zoom: u8,
    x: i64,
    y: i64,
    pad: u32,
    target_zoom: Option<u8>,
) -> Result<(), CliError> {
    let target_zoom = match target_zoom {
        Some(zoom) => zoom,
        None => load_config(config)?.coordinator.source_zoom,
    };

    let bbox = padded_bounding_box_at_zoom(x, y, zoom, pad, target_zoom)?;
    print!("{}", describe(&bbox));
    Ok(())
}

/// Human readable summary of a bounding box.
fn describe(bbox: &BoundingBox) -> String {
    let nw = TileCoord {
        x: bbox.nw.x,
        y: bbox.nw.y,
        zoom: bbox.zoom,
    };
    // South-east corner is the north-west corner of the next tile diagonally
    let past_se = TileCoord {
        x: bbox.se.x.saturating_add(1),
        y: bbox.se.y.saturating_add(1),
        zoom: bbox.zoom,
    };
    let (north, west) = tile_to_lat_lon(&nw);
    let (south, east) = tile_to_lat_lon(&past_se);

    format!(
        "Bounding box: {}\n  Size:  {}×{} ({} tiles)\n  North-west: {:.6}, {:.6}\n  South-east: {:.6}, {:.6}\n",
        bbox,
        bbox.width(),
        bbox.height(),
        bbox.tile_count(),
        north,
        west,
        south,
        east
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_world_tile() {
        let bbox = padded_bounding_box_at_zoom(0, 0, 0, 2, 0).unwrap();
        let text = describe(&bbox);

        assert!(text.contains("(1 tiles)"), "{}", text);
        assert!(text.contains("-180.000000"), "{}", text);
        assert!(text.contains("85.051129"), "{}", text);
    }

    #[test]
    fn test_explicit_target_zoom_does_not_need_config() {
        assert!(run(Some(Path::new("/nonexistent/config.ini")), 12, 10, 10, 2, Some(19)).is_ok());
    }

    #[test]
    fn test_out_of_range_tile_is_rejected() {
        let result = run(None, 3, 8, 0, 2, Some(19));
        assert!(matches!(result, Err(CliError::InvalidTile(_))));
    }
}
