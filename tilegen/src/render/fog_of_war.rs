//! Fog of war: a translucent mask over everything nobody has mapped yet.
//!
//! The whole tile starts fogged and each cell clears a disc that fades back
//! into the fog at its rim. A tile without data is fully masked, which is a
//! meaningful artifact, so this renderer always produces an image.

use image::{Rgba, RgbaImage};

use super::canvas::{for_each_pixel_in_disc, CellFootprint, TILE_SIZE};
use super::{ArtifactKind, RenderJob, TileRenderer};

/// Fog colour and opacity.
pub const FOG: Rgba<u8> = Rgba([40, 40, 40, 200]);

/// Smallest cleared radius in pixels.
const MIN_RADIUS_PX: f64 = 1.5;

/// Cleared radius relative to the cell's edge length.
const RADIUS_PER_CELL: f64 = 1.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct FogOfWarRenderer;

impl FogOfWarRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TileRenderer for FogOfWarRenderer {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::FogOfWar
    }

    fn render(&self, job: &RenderJob) -> Option<RgbaImage> {
        let mut image = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, FOG);
        let fog_alpha = FOG.0[3] as f64;

        for cell in &job.cells {
            let footprint = CellFootprint::of(cell, &job.tile, job.source_zoom);
            let (cx, cy) = footprint.center();
            let radius = (footprint.size * RADIUS_PER_CELL).max(MIN_RADIUS_PX);

            for_each_pixel_in_disc(cx, cy, radius, |px, py, ratio| {
                let pixel = image.get_pixel_mut(px, py);
                let alpha = (fog_alpha * ratio).round() as u8;
                pixel.0[3] = pixel.0[3].min(alpha);
            });
        }

        Some(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::store::AggregateCell;

    #[test]
    fn test_empty_tile_is_fully_fogged() {
        let job = RenderJob::new(TileCoord { x: 3, y: 3, zoom: 10 }, 19, vec![]);
        let image = FogOfWarRenderer::new().render(&job).unwrap();
        assert!(image.pixels().all(|p| *p == FOG));
    }

    #[test]
    fn test_mapped_cell_clears_fog() {
        let tile = TileCoord { x: 0, y: 0, zoom: 18 };
        let job = RenderJob::new(
            tile,
            19,
            vec![AggregateCell {
                x: 0,
                y: 0,
                gateway_id: "gw".to_string(),
                samples: 10,
                rssi_max: -100.0,
            }],
        );
        let image = FogOfWarRenderer::new().render(&job).unwrap();

        // Cell covers pixels 0..128; its centre is clear, the far corner is not
        assert!(image.get_pixel(64, 64).0[3] < 10);
        assert_eq!(*image.get_pixel(255, 255), FOG);
    }
}
