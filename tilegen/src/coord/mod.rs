//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and slippy map tile indices, plus the padded bounding boxes used to pull
//! aggregate data for a tile and its rendering neighbours.

mod types;

pub use types::{
    tiles_per_axis, BoundingBox, BoundingBoxTiles, CoordError, TileCoord, TileIndex, MAX_LAT,
    MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Fractional tile positions this close to an integer snap to it.
///
/// Corner coordinates produced by [`tile_to_lat_lon`] land exactly on tile
/// edges; trigonometric error must not push them into the previous tile.
const EDGE_SNAP_EPSILON: f64 = 1e-6;

/// Converts geographic coordinates to the containing tile.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 24)
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = tiles_per_axis(zoom) as f64;
    let max_index = tiles_per_axis(zoom) - 1;

    let fx = (lon + 180.0) / 360.0 * n;

    let lat_rad = lat * PI / 180.0;
    let fy = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;

    // The east edge and the southern limit belong to the last tile.
    let x = snap_floor(fx).clamp(0.0, max_index as f64) as u32;
    let y = snap_floor(fy).clamp(0.0, max_index as f64) as u32;

    Ok(TileCoord { x, y, zoom })
}

/// Converts a tile back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = tiles_per_axis(tile.zoom) as f64;

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Computes the region needed to regenerate a tile and its neighbours.
///
/// The tile's footprint is grown by `pad` tiles on every side at `zoom`
/// (clamped to the grid), then both corners are projected to `target_zoom`.
/// The result is inclusive on both corners.
///
/// Returns [`CoordError::OutOfRangeTile`] when `(x, y)` does not exist at
/// `zoom`, and [`CoordError::InvalidZoom`] for unsupported zoom levels.
pub fn padded_bounding_box_at_zoom(
    x: i64,
    y: i64,
    zoom: u8,
    pad: u32,
    target_zoom: u8,
) -> Result<BoundingBox, CoordError> {
    let tile = TileCoord::new(x, y, zoom)?;
    padded_bounds(&tile, pad, target_zoom)
}

/// Same as [`padded_bounding_box_at_zoom`] for an already validated tile.
pub fn padded_bounds(
    tile: &TileCoord,
    pad: u32,
    target_zoom: u8,
) -> Result<BoundingBox, CoordError> {
    if target_zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(target_zoom));
    }

    let max_index = tiles_per_axis(tile.zoom) - 1;
    let pad = pad as u64;

    let nw_x = (tile.x as u64).saturating_sub(pad);
    let nw_y = (tile.y as u64).saturating_sub(pad);
    let se_x = (tile.x as u64 + pad).min(max_index);
    let se_y = (tile.y as u64 + pad).min(max_index);

    let (nw_x, se_x) = project_span(nw_x, se_x, tile.zoom, target_zoom);
    let (nw_y, se_y) = project_span(nw_y, se_y, tile.zoom, target_zoom);

    Ok(BoundingBox {
        nw: TileIndex {
            x: nw_x as u32,
            y: nw_y as u32,
        },
        se: TileIndex {
            x: se_x as u32,
            y: se_y as u32,
        },
        zoom: target_zoom,
    })
}

/// Projects an inclusive index span between zoom levels.
///
/// Tiles nest exactly in the slippy scheme, so this is the same answer as
/// converting the span's corner coordinates geographically, without the
/// floating point error.
fn project_span(lo: u64, hi: u64, from: u8, to: u8) -> (u64, u64) {
    if to >= from {
        let shift = to - from;
        (lo << shift, ((hi + 1) << shift) - 1)
    } else {
        let shift = from - to;
        (lo >> shift, hi >> shift)
    }
}

#[inline]
fn snap_floor(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() < EDGE_SNAP_EPSILON {
        nearest
    } else {
        value.floor()
    }
}

#[cfg(test)]
mod tests;
