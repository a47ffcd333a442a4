//! Global coverage heatmap.
//!
//! Every cell paints a disc coloured by its strongest RSSI. Where discs
//! overlap the strongest signal wins, and opacity falls off towards the rim.
//! Discs from padding cells bleed across the tile edge so neighbouring tiles
//! join without seams.

use image::{Rgba, RgbaImage};

use super::canvas::{for_each_pixel_in_disc, CellFootprint, TILE_SIZE};
use super::{ArtifactKind, RenderJob, TileRenderer};

/// Smallest disc radius in pixels, so low zoom tiles still show coverage.
const MIN_RADIUS_PX: f64 = 2.0;

/// Disc radius relative to the cell's edge length.
const RADIUS_PER_CELL: f64 = 0.75;

/// Opacity at the rim of a disc (0-255).
const RIM_ALPHA: f64 = 96.0;

/// Colour ramp from strong (red) to weak (blue) signal, in dBm.
const RAMP: [(f64, [u8; 3]); 6] = [
    (-100.0, [255, 0, 0]),
    (-105.0, [255, 126, 0]),
    (-110.0, [255, 255, 0]),
    (-115.0, [0, 255, 0]),
    (-120.0, [0, 255, 255]),
    (f64::NEG_INFINITY, [0, 0, 255]),
];

/// Returns the ramp colour for a signal strength.
pub fn rssi_color(rssi: f64) -> [u8; 3] {
    RAMP.iter()
        .find(|(threshold, _)| rssi >= *threshold)
        .map(|(_, color)| *color)
        .unwrap_or([0, 0, 255])
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HeatmapRenderer;

impl HeatmapRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TileRenderer for HeatmapRenderer {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::GlobalHeatmap
    }

    fn render(&self, job: &RenderJob) -> Option<RgbaImage> {
        let pixels = (TILE_SIZE * TILE_SIZE) as usize;
        let mut best_rssi = vec![f64::NEG_INFINITY; pixels];
        let mut weight = vec![0.0_f64; pixels];
        let mut painted = false;

        for cell in &job.cells {
            let footprint = CellFootprint::of(cell, &job.tile, job.source_zoom);
            let (cx, cy) = footprint.center();
            let radius = (footprint.size * RADIUS_PER_CELL).max(MIN_RADIUS_PX);

            for_each_pixel_in_disc(cx, cy, radius, |px, py, ratio| {
                let i = (py * TILE_SIZE + px) as usize;
                best_rssi[i] = best_rssi[i].max(cell.rssi_max);
                weight[i] = weight[i].max(1.0 - ratio);
                painted = true;
            });
        }

        if !painted {
            return None;
        }

        let mut image = RgbaImage::new(TILE_SIZE, TILE_SIZE);
        for (i, pixel) in image.pixels_mut().enumerate() {
            if best_rssi[i] == f64::NEG_INFINITY {
                continue;
            }
            let [r, g, b] = rssi_color(best_rssi[i]);
            let alpha = RIM_ALPHA + (255.0 - RIM_ALPHA) * weight[i];
            *pixel = Rgba([r, g, b, alpha.round() as u8]);
        }

        Some(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::store::AggregateCell;

    fn cell(x: u32, y: u32, rssi: f64) -> AggregateCell {
        AggregateCell {
            x,
            y,
            gateway_id: "gw".to_string(),
            samples: 3,
            rssi_max: rssi,
        }
    }

    #[test]
    fn test_ramp_thresholds() {
        assert_eq!(rssi_color(-80.0), [255, 0, 0]);
        assert_eq!(rssi_color(-100.0), [255, 0, 0]);
        assert_eq!(rssi_color(-112.0), [0, 255, 0]);
        assert_eq!(rssi_color(-140.0), [0, 0, 255]);
    }

    #[test]
    fn test_empty_job_renders_nothing() {
        let job = RenderJob::new(TileCoord { x: 0, y: 0, zoom: 12 }, 19, vec![]);
        assert!(HeatmapRenderer::new().render(&job).is_none());
    }

    #[test]
    fn test_cell_colours_its_pixels() {
        // Zoom 17 tile (0,0): source cell (1,1) covers pixels 64..128
        let tile = TileCoord { x: 0, y: 0, zoom: 17 };
        let job = RenderJob::new(tile, 19, vec![cell(1, 1, -95.0)]);
        let image = HeatmapRenderer::new().render(&job).unwrap();

        let centre = image.get_pixel(96, 96);
        assert_eq!(&centre.0[..3], &[255, 0, 0]);
        assert!(centre.0[3] > 240);
        assert_eq!(image.get_pixel(250, 250).0[3], 0);
    }

    #[test]
    fn test_strongest_signal_wins_on_overlap() {
        let tile = TileCoord { x: 0, y: 0, zoom: 19 };
        let job = RenderJob::new(tile, 19, vec![cell(0, 0, -118.0), cell(0, 0, -101.0)]);
        let image = HeatmapRenderer::new().render(&job).unwrap();

        assert_eq!(&image.get_pixel(128, 128).0[..3], &rssi_color(-101.0));
    }

    #[test]
    fn test_padding_cell_bleeds_over_edge() {
        // Cell centred just west of the tile still reaches its first columns
        let tile = TileCoord { x: 1, y: 0, zoom: 18 };
        let job = RenderJob::new(tile, 19, vec![cell(1, 0, -100.0)]);
        let image = HeatmapRenderer::new().render(&job).unwrap();

        assert!(image.get_pixel(0, 64).0[3] > 0);
    }
}
