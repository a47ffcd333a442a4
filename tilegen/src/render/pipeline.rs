//! The production render handler.

use std::path::Path;

use tracing::trace;

use super::{
    ArtifactKind, FogOfWarRenderer, GatewayCountRenderer, HeatmapRenderer, RenderError, RenderJob,
    TileRenderer, TileWriter,
};
use crate::config::OutputSettings;
use crate::dispatcher::{JobReport, RenderHandler};

struct Stage {
    renderer: Box<dyn TileRenderer>,
    writer: TileWriter,
}

/// Runs every configured renderer for a job and persists the results.
///
/// When a renderer has nothing to draw the stale file from an earlier run is
/// removed, so empty areas never keep outdated coverage.
#[derive(Default)]
pub struct RenderPipeline {
    stages: Vec<Stage>,
}

impl RenderPipeline {
    /// Creates a pipeline with no renderers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the standard pipeline writing all three artifacts.
    pub fn from_settings(output: &OutputSettings) -> Self {
        Self::new()
            .with_stage(HeatmapRenderer::new(), &output.global_heatmap_dir)
            .with_stage(GatewayCountRenderer::new(), &output.gateway_count_dir)
            .with_stage(FogOfWarRenderer::new(), &output.fog_of_war_dir)
    }

    /// Adds a renderer writing below `dir`.
    pub fn with_stage(mut self, renderer: impl TileRenderer + 'static, dir: &Path) -> Self {
        let writer = TileWriter::new(renderer.kind(), dir);
        self.stages.push(Stage {
            renderer: Box::new(renderer),
            writer,
        });
        self
    }

    /// Artifact kinds produced, in execution order.
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        self.stages.iter().map(|s| s.renderer.kind()).collect()
    }
}

impl RenderHandler for RenderPipeline {
    fn handle(&self, job: &RenderJob) -> Result<JobReport, RenderError> {
        let mut report = JobReport::default();

        for stage in &self.stages {
            let kind = stage.renderer.kind();
            match stage.renderer.render(job) {
                Some(image) => {
                    let path = stage.writer.write(&job.tile, &image)?;
                    trace!(kind = %kind, tile = %job.tile, path = %path.display(), "Tile written");
                    report.written += 1;
                }
                None => {
                    if stage.writer.remove(&job.tile)? {
                        trace!(kind = %kind, tile = %job.tile, "Stale tile removed");
                        report.removed += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}
