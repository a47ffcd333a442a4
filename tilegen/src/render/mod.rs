//! Rendering collaborators.
//!
//! A [`RenderJob`] holds one output tile plus the aggregate cells around it.
//! Each [`TileRenderer`] turns a job into at most one 256×256 RGBA image, and
//! [`TileWriter`] persists it as `<dir>/<z>/<x>/<y>.png`. [`RenderPipeline`]
//! ties enabled renderers to their output directories and is what the
//! dispatcher's workers run.
//!
//! # Artifacts
//!
//! | Kind | Renderer | Empty tile |
//! |------|----------|------------|
//! | Global heatmap | [`HeatmapRenderer`] | stale file removed |
//! | Gateway count | [`GatewayCountRenderer`] | stale file removed |
//! | Fog of war | [`FogOfWarRenderer`] | fully masked tile |

mod canvas;
mod fog_of_war;
mod gateway_count;
mod heatmap;
mod pipeline;
mod writer;

pub use canvas::{CellFootprint, TILE_SIZE};
pub use fog_of_war::FogOfWarRenderer;
pub use gateway_count::GatewayCountRenderer;
pub use heatmap::{rssi_color, HeatmapRenderer};
pub use pipeline::RenderPipeline;
pub use writer::TileWriter;

use std::fmt;
use std::path::PathBuf;

use image::RgbaImage;
use thiserror::Error;

use crate::coord::TileCoord;
use crate::store::AggregateCell;

/// One output tile to regenerate, with the cells needed to draw it.
///
/// Cells cover the tile plus its padding so edge effects line up with the
/// neighbouring tiles. The job is moved into the worker that renders it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub tile: TileCoord,
    /// Zoom level the cell indices are expressed at
    pub source_zoom: u8,
    pub cells: Vec<AggregateCell>,
}

impl RenderJob {
    pub fn new(tile: TileCoord, source_zoom: u8, cells: Vec<AggregateCell>) -> Self {
        Self {
            tile,
            source_zoom,
            cells,
        }
    }
}

/// The raster products generated for every tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    GlobalHeatmap,
    GatewayCount,
    FogOfWar,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::GlobalHeatmap,
        ArtifactKind::GatewayCount,
        ArtifactKind::FogOfWar,
    ];
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::GlobalHeatmap => "global heatmap",
            ArtifactKind::GatewayCount => "gateway count",
            ArtifactKind::FogOfWar => "fog of war",
        };
        f.write_str(name)
    }
}

/// Errors raised while producing or persisting one job's artifacts.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The image could not be encoded
    #[error("Failed to encode {kind} tile {tile}: {message}")]
    Encode {
        kind: ArtifactKind,
        tile: TileCoord,
        message: String,
    },

    /// Writing, renaming or removing a tile file failed
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The renderer panicked; the worker survived it
    #[error("Render of tile {0} panicked")]
    Panicked(TileCoord),
}

/// Draws one artifact kind.
///
/// Renderers are pure: they read the job and return an image, leaving
/// persistence to [`TileWriter`]. `None` means the tile has nothing to show.
pub trait TileRenderer: Send + Sync {
    fn kind(&self) -> ArtifactKind;

    fn render(&self, job: &RenderJob) -> Option<RgbaImage>;
}
