//! Projection of aggregate cells onto a tile's pixel grid.

use crate::coord::TileCoord;
use crate::store::AggregateCell;

/// Output tiles are 256×256 pixels.
pub const TILE_SIZE: u32 = 256;

/// A cell's square footprint in pixel space of one output tile.
///
/// The origin is the tile's north-west pixel. Cells from the padding lie
/// partly or fully outside `0..TILE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFootprint {
    pub x: f64,
    pub y: f64,
    /// Edge length in pixels; shrinks by half per zoom level below the source
    pub size: f64,
}

impl CellFootprint {
    pub fn of(cell: &AggregateCell, tile: &TileCoord, source_zoom: u8) -> Self {
        Self::at(cell.x, cell.y, tile, source_zoom)
    }

    /// Footprint of the source cell `(x, y)` at `source_zoom`.
    pub fn at(x: u32, y: u32, tile: &TileCoord, source_zoom: u8) -> Self {
        let scale = TILE_SIZE as f64 * 2f64.powi(tile.zoom as i32 - source_zoom as i32);
        let origin = TILE_SIZE as f64;
        Self {
            x: x as f64 * scale - tile.x as f64 * origin,
            y: y as f64 * scale - tile.y as f64 * origin,
            size: scale,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    /// Pixel rectangle `(x0, y0, x1, y1)` covered by the footprint, clipped
    /// to the tile, with exclusive upper bounds. Sub-pixel cells still cover
    /// the pixel they fall in. `None` when the cell is off-tile.
    pub fn pixel_rect(&self) -> Option<(u32, u32, u32, u32)> {
        let (x0, x1) = clip_span(self.x, self.size)?;
        let (y0, y1) = clip_span(self.y, self.size)?;
        Some((x0, y0, x1, y1))
    }
}

fn clip_span(start: f64, size: f64) -> Option<(u32, u32)> {
    let limit = TILE_SIZE as f64;
    let lo = start.floor();
    let hi = (start + size).ceil().max(lo + 1.0);
    if lo >= limit || hi <= 0.0 {
        return None;
    }
    Some((lo.max(0.0) as u32, hi.min(limit) as u32))
}

/// Calls `f(px, py, distance_ratio)` for every tile pixel whose centre lies
/// within `radius` of `(cx, cy)`. The ratio is 0 at the centre and 1 at the
/// rim.
pub(super) fn for_each_pixel_in_disc(
    cx: f64,
    cy: f64,
    radius: f64,
    mut f: impl FnMut(u32, u32, f64),
) {
    let limit = TILE_SIZE as f64;
    let x0 = (cx - radius).floor().max(0.0);
    let x1 = (cx + radius).ceil().min(limit);
    let y0 = (cy - radius).floor().max(0.0);
    let y1 = (cy + radius).ceil().min(limit);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for py in y0 as u32..y1 as u32 {
        for px in x0 as u32..x1 as u32 {
            let dx = px as f64 + 0.5 - cx;
            let dy = py as f64 + 0.5 - cy;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance <= radius {
                f(px, py, distance / radius);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: u32, y: u32) -> AggregateCell {
        AggregateCell {
            x,
            y,
            gateway_id: "gw".to_string(),
            samples: 1,
            rssi_max: -90.0,
        }
    }

    #[test]
    fn test_footprint_at_source_zoom_fills_tile() {
        let tile = TileCoord { x: 7, y: 9, zoom: 19 };
        let fp = CellFootprint::of(&cell(7, 9), &tile, 19);
        assert_eq!(fp, CellFootprint { x: 0.0, y: 0.0, size: 256.0 });
        assert_eq!(fp.pixel_rect(), Some((0, 0, 256, 256)));
    }

    #[test]
    fn test_footprint_two_zooms_below_source() {
        // At zoom 17 a tile holds 4×4 source cells of 64 px each
        let tile = TileCoord { x: 1, y: 1, zoom: 17 };
        let fp = CellFootprint::of(&cell(6, 5), &tile, 19);
        assert_eq!(fp.x, 128.0);
        assert_eq!(fp.y, 64.0);
        assert_eq!(fp.size, 64.0);
        assert_eq!(fp.pixel_rect(), Some((128, 64, 192, 128)));
    }

    #[test]
    fn test_sub_pixel_cell_covers_one_pixel() {
        // At zoom 9 a source cell is 256 / 1024 = 0.25 px
        let tile = TileCoord { x: 0, y: 0, zoom: 9 };
        let fp = CellFootprint::of(&cell(41, 3), &tile, 19);
        assert_eq!(fp.pixel_rect(), Some((10, 0, 11, 1)));
    }

    #[test]
    fn test_padding_cell_is_off_tile() {
        let tile = TileCoord { x: 4, y: 4, zoom: 19 };
        assert!(CellFootprint::of(&cell(3, 4), &tile, 19).pixel_rect().is_none());
        assert!(CellFootprint::of(&cell(5, 4), &tile, 19).pixel_rect().is_none());
    }

    #[test]
    fn test_disc_is_clipped_to_tile() {
        let mut count = 0;
        let mut max_ratio: f64 = 0.0;
        for_each_pixel_in_disc(0.0, 0.0, 4.0, |px, py, ratio| {
            assert!(px < 4 && py < 4);
            max_ratio = max_ratio.max(ratio);
            count += 1;
        });
        assert!(count > 0 && count < 16);
        assert!(max_ratio <= 1.0);
    }
}
