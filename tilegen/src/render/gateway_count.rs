//! Gateway count tiles: each cell is filled with a colour for the number of
//! distinct gateways that heard it.

use std::collections::{HashMap, HashSet};

use image::{Rgba, RgbaImage};

use super::canvas::{CellFootprint, TILE_SIZE};
use super::{ArtifactKind, RenderJob, TileRenderer};

/// Colours for 1, 2, 3, 4 and 5+ gateways.
const COUNT_COLORS: [[u8; 4]; 5] = [
    [0, 0, 255, 160],
    [0, 255, 255, 176],
    [0, 255, 0, 192],
    [255, 255, 0, 208],
    [255, 0, 0, 224],
];

pub fn gateway_count_color(count: usize) -> Rgba<u8> {
    let index = count.clamp(1, COUNT_COLORS.len()) - 1;
    Rgba(COUNT_COLORS[index])
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GatewayCountRenderer;

impl GatewayCountRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TileRenderer for GatewayCountRenderer {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::GatewayCount
    }

    fn render(&self, job: &RenderJob) -> Option<RgbaImage> {
        let mut gateways: HashMap<(u32, u32), HashSet<&str>> = HashMap::new();
        for cell in &job.cells {
            gateways
                .entry((cell.x, cell.y))
                .or_default()
                .insert(cell.gateway_id.as_str());
        }

        // Draw in a fixed order so overlapping sub-pixel cells resolve the
        // same way on every run.
        let mut counted: Vec<_> = gateways
            .into_iter()
            .map(|(xy, ids)| (xy, ids.len()))
            .collect();
        counted.sort_by_key(|&((x, y), count)| (count, y, x));

        let mut image = RgbaImage::new(TILE_SIZE, TILE_SIZE);
        let mut painted = false;

        for ((x, y), count) in counted {
            let Some((x0, y0, x1, y1)) =
                CellFootprint::at(x, y, &job.tile, job.source_zoom).pixel_rect()
            else {
                continue;
            };

            let color = gateway_count_color(count);
            for py in y0..y1 {
                for px in x0..x1 {
                    image.put_pixel(px, py, color);
                }
            }
            painted = true;
        }

        painted.then_some(image)
    }
}
