//! Projection run over the data root.
//!
//! Four stages, each reading one source file and writing its vertex and edge
//! groups to the intermediate store. The entity registry is shared by all
//! stages of a run; projected groups are flushed after every stage.

use std::fmt;
use std::path::PathBuf;

use crate::config::DataConfig;
use crate::decode::{open_reader, read_rows, RowOutcome};
use crate::error::AppError;
use crate::models::{CreditsRow, KeywordsRow, MovieMetadataRow, VertexKind};
use crate::projection::ratings::read_ratings;
use crate::projection::{
    CreditsProjector, KeywordsProjector, LinkTable, MovieProjector, ProjectionContext, Projector,
    RatingsProjector, StageReport, UserProjector,
};
use crate::store::{IntermediateStore, WriteOutcome};
use crate::synth::Relation;

pub const METADATA_FILE: &str = "movies_metadata.csv";
pub const CREDITS_FILE: &str = "credits.csv";
pub const KEYWORDS_FILE: &str = "keywords.csv";

const PROGRESS_INTERVAL: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Metadata,
    Credits,
    Keywords,
    Ratings,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Metadata, Stage::Credits, Stage::Keywords, Stage::Ratings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Metadata => "metadata",
            Stage::Credits => "credits",
            Stage::Keywords => "keywords",
            Stage::Ratings => "ratings",
        }
    }

    pub fn source_path(&self, data: &DataConfig) -> PathBuf {
        match self {
            Stage::Metadata => data.source_path(METADATA_FILE),
            Stage::Credits => data.source_path(CREDITS_FILE),
            Stage::Keywords => data.source_path(KEYWORDS_FILE),
            Stage::Ratings => data.source_path(&data.ratings_file),
        }
    }

    pub fn vertex_outputs(&self) -> &'static [VertexKind] {
        match self {
            Stage::Metadata => &[
                VertexKind::Movie,
                VertexKind::Collection,
                VertexKind::Genre,
                VertexKind::Language,
                VertexKind::Company,
                VertexKind::Country,
            ],
            Stage::Credits => &[VertexKind::Person],
            Stage::Keywords => &[VertexKind::Keyword],
            Stage::Ratings => &[VertexKind::User],
        }
    }

    pub fn edge_outputs(&self) -> &'static [Relation] {
        match self {
            Stage::Metadata => &[
                Relation::BelongsToCollection,
                Relation::Genre,
                Relation::Language,
                Relation::ProducedBy,
                Relation::ProducedIn,
            ],
            Stage::Credits => &[Relation::Cast, Relation::Crew],
            Stage::Keywords => &[Relation::Keyword],
            Stage::Ratings => &[Relation::Rated],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Every output already existed; the source was not read.
    Skipped,
    Projected {
        report: StageReport,
        /// Rows the CSV reader could not decode.
        malformed: usize,
        /// Groups written (the rest already existed).
        written: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub stages: Vec<(Stage, StageOutcome)>,
}

impl PipelineReport {
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|(s, _)| *s == stage).map(|(_, o)| o)
    }
}

pub struct ProjectionPipeline {
    data: DataConfig,
    store: IntermediateStore,
}

impl ProjectionPipeline {
    /// Pipeline reading sources from `data.root` and writing interchange
    /// files under the same root.
    pub fn new(data: DataConfig) -> Self {
        let store = IntermediateStore::new(&data.root);
        Self { data, store }
    }

    pub fn store(&self) -> &IntermediateStore {
        &self.store
    }

    pub fn run(&self) -> Result<PipelineReport, AppError> {
        let mut ctx = ProjectionContext::new();
        let mut report = PipelineReport::default();
        for stage in Stage::ALL {
            let outcome = self.run_stage(stage, &mut ctx)?;
            report.stages.push((stage, outcome));
        }
        Ok(report)
    }

    pub fn run_stage(
        &self,
        stage: Stage,
        ctx: &mut ProjectionContext,
    ) -> Result<StageOutcome, AppError> {
        if self
            .store
            .all_present(stage.vertex_outputs(), stage.edge_outputs())
        {
            tracing::info!(%stage, "outputs already generated, skipping stage");
            return Ok(StageOutcome::Skipped);
        }

        let path = stage.source_path(&self.data);
        tracing::info!(%stage, source = %path.display(), "projecting");
        let (report, malformed) = match stage {
            Stage::Metadata => project_csv::<MovieMetadataRow, _>(ctx, stage, &path, &MovieProjector)?,
            Stage::Credits => project_csv::<CreditsRow, _>(ctx, stage, &path, &CreditsProjector)?,
            Stage::Keywords => project_csv::<KeywordsRow, _>(ctx, stage, &path, &KeywordsProjector)?,
            Stage::Ratings => self.project_ratings(ctx, &path)?,
        };

        let graph = ctx.take_graph();
        let written = self
            .store
            .write_groups(&graph, stage.vertex_outputs(), stage.edge_outputs())?
            .iter()
            .filter(|(_, outcome)| *outcome == WriteOutcome::Written)
            .count();

        tracing::info!(
            %stage,
            records = report.records,
            rejected = report.rejected,
            malformed,
            failed_fields = report.failed_fields,
            vertices = report.vertices,
            edges = report.edges,
            written,
            "stage complete"
        );
        Ok(StageOutcome::Projected {
            report,
            malformed,
            written,
        })
    }

    fn project_ratings(
        &self,
        ctx: &mut ProjectionContext,
        path: &std::path::Path,
    ) -> Result<(StageReport, usize), AppError> {
        let links_path = self.data.source_path(&self.data.links_file);
        let links = if links_path.exists() {
            Some(LinkTable::load(&links_path)?)
        } else {
            tracing::info!(path = %links_path.display(), "no link table, using raw movie ids");
            None
        };
        let ratings = RatingsProjector::new(links);

        let mut report = StageReport::default();
        let mut malformed = 0;
        for outcome in read_ratings(open_reader(path)?) {
            match outcome {
                RowOutcome::Row(row) => {
                    let mut record = ctx.apply(&UserProjector, row.clone());
                    record.merge(ctx.apply(&ratings, row));
                    record.records = 1;
                    report.merge(record);
                    if report.records % PROGRESS_INTERVAL == 0 {
                        tracing::info!(stage = "ratings", processed = report.records, "projection progress");
                    }
                }
                RowOutcome::Malformed { line, reason } => {
                    tracing::warn!(line, %reason, "skipping malformed ratings row");
                    malformed += 1;
                }
            }
        }
        Ok((report, malformed))
    }
}

fn project_csv<T, P>(
    ctx: &mut ProjectionContext,
    stage: Stage,
    path: &std::path::Path,
    projector: &P,
) -> Result<(StageReport, usize), AppError>
where
    T: serde::de::DeserializeOwned,
    P: Projector<Record = T>,
{
    let mut malformed = 0;
    let rows = read_rows::<T, _>(open_reader(path)?)?.filter_map(|outcome| match outcome {
        RowOutcome::Row(row) => Some(row),
        RowOutcome::Malformed { line, reason } => {
            tracing::warn!(%stage, line, %reason, "skipping malformed row");
            malformed += 1;
            None
        }
    });
    let report = ctx.run(stage.as_str(), projector, rows);
    Ok((report, malformed))
}
