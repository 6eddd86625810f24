//! Project command handler.

use color_eyre::Result;

use crate::context::Context;
use crate::pipeline::StageOutcome;

use super::App;

impl App {
    /// Run the projection stages over the configured data root.
    pub async fn run_project(&self) -> Result<()> {
        let ctx = Context::load()?;
        tracing::info!(root = %ctx.config.data.root.display(), "Projecting sources");

        let pipeline = ctx.pipeline();
        // Projection is synchronous file work
        let report = tokio::task::spawn_blocking(move || pipeline.run()).await??;

        for (stage, outcome) in &report.stages {
            match outcome {
                StageOutcome::Skipped => tracing::info!(%stage, "skipped"),
                StageOutcome::Projected {
                    report, malformed, ..
                } => tracing::info!(
                    %stage,
                    records = report.records,
                    malformed,
                    vertices = report.vertices,
                    edges = report.edges,
                    "projected"
                ),
            }
        }
        Ok(())
    }
}
