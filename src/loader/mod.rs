//! Bulk loader: drives the intermediate store into a sink.
//!
//! A run moves through `Uninitialized → Provisioned → LoadingVertices →
//! LoadingEdges → Completed`; an unrecoverable error while loading moves it
//! to `Failed`. Groups are imported one at a time, vertices first, and a
//! group that fails to import is logged and counted but does not stop the
//! run. Nothing is rolled back.

pub mod cancel;
pub mod summary;

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use crate::error::{AppError, SinkError};
use crate::graph::{BulkExecutor, BulkImportOptions, BulkSink, CollectionSpec, GraphDocument};
use crate::models::{EdgeDescriptor, VertexKind};
use crate::store::IntermediateStore;
use crate::synth::Relation;

pub use cancel::CancellationToken;
pub use summary::{BatchSummary, RunSummary};

/// Vertex groups in import order.
pub const VERTEX_LOAD_ORDER: [VertexKind; 9] = [
    VertexKind::Person,
    VertexKind::Keyword,
    VertexKind::Genre,
    VertexKind::Country,
    VertexKind::Company,
    VertexKind::Language,
    VertexKind::Movie,
    VertexKind::Collection,
    VertexKind::User,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Uninitialized,
    Provisioned,
    LoadingVertices,
    LoadingEdges,
    Completed,
    Failed,
}

impl LoaderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderState::Uninitialized => "uninitialized",
            LoaderState::Provisioned => "provisioned",
            LoaderState::LoadingVertices => "loading_vertices",
            LoaderState::LoadingEdges => "loading_edges",
            LoaderState::Completed => "completed",
            LoaderState::Failed => "failed",
        }
    }

    pub fn can_transition(&self, to: LoaderState) -> bool {
        use LoaderState::*;
        matches!(
            (self, to),
            (Uninitialized, Provisioned)
                | (Provisioned, LoadingVertices)
                | (LoadingVertices, LoadingEdges)
                | (LoadingEdges, Completed)
                | (LoadingVertices, Failed)
                | (LoadingEdges, Failed)
        )
    }
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one load run.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub database: String,
    pub collection: String,
    pub partition_key: String,
    pub throughput: u32,
    /// Drop and recreate the collection before loading.
    pub cleanup_on_start: bool,
    /// Drop the collection after a completed run.
    pub cleanup_on_finish: bool,
    pub batch_size: usize,
    pub max_concurrency: usize,
    /// Drop edges whose endpoints are not among the loaded vertex groups.
    pub validate_edges: bool,
}

impl LoadOptions {
    fn collection_spec(&self, name: &str) -> CollectionSpec {
        CollectionSpec {
            name: name.to_string(),
            partition_key: self.partition_key.clone(),
            throughput: self.throughput,
        }
    }

    fn import_options(&self) -> BulkImportOptions {
        BulkImportOptions {
            upsert: true,
            auto_generate_id: false,
            max_concurrency: self.max_concurrency,
            batch_size: self.batch_size,
        }
    }
}

/// Result of importing one group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    Imported(BatchSummary),
    /// The group had nothing to write.
    Empty,
    /// The import failed; the run continues with the next group.
    Failed(SinkError),
}

pub struct BulkLoader<S: BulkSink> {
    sink: S,
    options: LoadOptions,
    state: LoaderState,
    executor: Option<BulkExecutor<S>>,
    summary: RunSummary,
}

impl<S: BulkSink> BulkLoader<S> {
    pub fn new(sink: S, options: LoadOptions) -> Self {
        Self {
            sink,
            options,
            state: LoaderState::Uninitialized,
            executor: None,
            summary: RunSummary::default(),
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    fn transition(&mut self, to: LoaderState) -> Result<(), AppError> {
        if !self.state.can_transition(to) {
            return Err(AppError::InvalidState {
                from: self.state.as_str(),
                to: to.as_str(),
            });
        }
        tracing::debug!(from = %self.state, %to, "loader transition");
        self.state = to;
        Ok(())
    }

    /// Prepares the collection and initializes the bulk capability.
    ///
    /// With `cleanup_on_start` the collection is dropped (if present) and
    /// recreated; otherwise it must already exist.
    pub async fn provision(&mut self) -> Result<(), AppError> {
        if self.state != LoaderState::Uninitialized {
            return Err(AppError::InvalidState {
                from: self.state.as_str(),
                to: LoaderState::Provisioned.as_str(),
            });
        }

        let collection = self.sink.collection().to_string();
        if self.options.cleanup_on_start {
            tracing::info!(collection = %collection, "recreating collection");
            self.sink.drop_collection().await?;
            self.sink
                .create_collection(&self.options.collection_spec(&collection))
                .await?;
        } else if !self.sink.collection_exists().await? {
            return Err(AppError::CollectionNotFound {
                database: self.options.database.clone(),
                collection: self.options.collection.clone(),
            });
        }

        self.executor = Some(BulkExecutor::initialize(&self.sink).await?);
        self.transition(LoaderState::Provisioned)
    }

    /// Imports one group. Sink failures are recorded and reported in the
    /// outcome; only cancellation is returned as an error.
    pub async fn load_group(
        &mut self,
        group: &str,
        docs: Vec<GraphDocument>,
        cancel: &CancellationToken,
    ) -> Result<GroupOutcome, AppError> {
        let executor = self
            .executor
            .as_ref()
            .ok_or_else(|| AppError::Internal("loader used before provisioning".into()))?;

        if docs.is_empty() {
            tracing::debug!(group, "empty group, nothing to import");
            return Ok(GroupOutcome::Empty);
        }

        let count = docs.len();
        match executor
            .bulk_import(docs, &self.options.import_options(), cancel)
            .await
        {
            Ok(response) => {
                let batch = BatchSummary::from_response(group, &response);
                tracing::info!(
                    group,
                    imported = batch.imported,
                    elapsed_secs = batch.elapsed.as_secs_f64(),
                    writes_per_sec = batch.writes_per_second(),
                    ru_per_sec = batch.ru_per_second(),
                    avg_ru_per_doc = batch.average_ru_per_document(),
                    throttled = response.throttled,
                    "group imported"
                );
                self.summary.record(batch.clone());
                Ok(GroupOutcome::Imported(batch))
            }
            Err(SinkError::Cancelled) => Err(AppError::Cancelled),
            Err(err) => {
                tracing::error!(group, count, error = %err, "group import failed, continuing");
                self.summary.record_failure(group);
                Ok(GroupOutcome::Failed(err))
            }
        }
    }

    /// Runs a complete load from `store`.
    pub async fn run(
        &mut self,
        store: &IntermediateStore,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, AppError> {
        let started = Instant::now();
        if self.state == LoaderState::Uninitialized {
            self.provision().await?;
        }

        self.transition(LoaderState::LoadingVertices)?;
        let known_ids = match self.load_vertices(store, cancel).await {
            Ok(ids) => ids,
            Err(err) => return self.fail(err),
        };

        self.transition(LoaderState::LoadingEdges)?;
        if let Err(err) = self.load_edges(store, &known_ids, cancel).await {
            return self.fail(err);
        }

        self.transition(LoaderState::Completed)?;
        self.summary.total_elapsed = started.elapsed();
        self.summary.log();

        if self.options.cleanup_on_finish {
            tracing::info!(collection = self.sink.collection(), "dropping collection");
            self.sink.drop_collection().await?;
        }
        Ok(self.summary.clone())
    }

    fn fail(&mut self, err: AppError) -> Result<RunSummary, AppError> {
        self.transition(LoaderState::Failed)?;
        tracing::error!(error = %err, "load run failed");
        self.summary.log();
        Err(err)
    }

    async fn load_vertices(
        &mut self,
        store: &IntermediateStore,
        cancel: &CancellationToken,
    ) -> Result<HashSet<String>, AppError> {
        let mut known_ids = HashSet::new();
        for kind in VERTEX_LOAD_ORDER {
            let Some(vertices) = store.read_vertices(kind)? else {
                tracing::warn!(group = kind.file_stem(), "vertex group not generated, skipping");
                continue;
            };
            if self.options.validate_edges {
                known_ids.extend(vertices.iter().map(|v| v.id.clone()));
            }
            let docs = vertices.into_iter().map(GraphDocument::from).collect();
            self.load_group(kind.file_stem(), docs, cancel).await?;
        }
        Ok(known_ids)
    }

    async fn load_edges(
        &mut self,
        store: &IntermediateStore,
        known_ids: &HashSet<String>,
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        for relation in Relation::ALL {
            let Some(mut edges) = store.read_edges(relation)? else {
                tracing::warn!(group = relation.file_stem(), "edge group not generated, skipping");
                continue;
            };
            if self.options.validate_edges {
                let dropped = drop_dangling(&mut edges, known_ids);
                if dropped > 0 {
                    tracing::warn!(
                        group = relation.file_stem(),
                        dropped,
                        "dropping edges with unknown endpoints"
                    );
                    self.summary.dangling_edges += dropped;
                }
            }
            let docs = edges.into_iter().map(GraphDocument::from).collect();
            self.load_group(relation.file_stem(), docs, cancel).await?;
        }
        Ok(())
    }
}

/// Removes edges whose endpoints are not in `known_ids`; returns how many.
pub fn drop_dangling(edges: &mut Vec<EdgeDescriptor>, known_ids: &HashSet<String>) -> usize {
    let before = edges.len();
    edges.retain(|e| known_ids.contains(&e.from_id) && known_ids.contains(&e.to_id));
    before - edges.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::backends::memory::{Fault, MemorySink};
    use crate::models::VertexDescriptor;

    fn options() -> LoadOptions {
        LoadOptions {
            database: "db".into(),
            collection: "movies".into(),
            partition_key: "/pk".into(),
            throughput: 1_000_000,
            cleanup_on_start: true,
            cleanup_on_finish: false,
            batch_size: 100,
            max_concurrency: 2,
            validate_edges: true,
        }
    }

    #[test]
    fn test_state_transitions() {
        use LoaderState::*;
        assert!(Uninitialized.can_transition(Provisioned));
        assert!(LoadingEdges.can_transition(Failed));
        assert!(!Uninitialized.can_transition(LoadingVertices));
        assert!(!Provisioned.can_transition(Failed));
        assert!(!Completed.can_transition(LoadingVertices));
    }

    #[test]
    fn test_drop_dangling() {
        let known: HashSet<String> = ["movie-1", "genre-1"].iter().map(|s| s.to_string()).collect();
        let mut edges = vec![
            Relation::Genre.forward("movie-1", "genre-1"),
            Relation::Genre.forward("movie-1", "genre-9"),
        ];
        assert_eq!(drop_dangling(&mut edges, &known), 1);
        assert_eq!(edges[0].to_id, "genre-1");
    }

    #[tokio::test]
    async fn test_attach_fails_fast_without_collection() {
        let mut loader = BulkLoader::new(
            MemorySink::new("movies"),
            LoadOptions {
                cleanup_on_start: false,
                ..options()
            },
        );
        let err = loader.provision().await.unwrap_err();
        assert!(matches!(err, AppError::CollectionNotFound { .. }));
        assert_eq!(loader.state(), LoaderState::Uninitialized);
    }

    #[tokio::test]
    async fn test_failed_group_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());
        store
            .write_vertices(
                VertexKind::Genre,
                &[VertexDescriptor::new("genre-1", VertexKind::Genre)],
            )
            .unwrap();
        store
            .write_vertices(
                VertexKind::Movie,
                &[VertexDescriptor::new("movie-1", VertexKind::Movie)],
            )
            .unwrap();

        let sink = MemorySink::new("movies");
        let mut loader = BulkLoader::new(sink.clone(), options());
        loader.provision().await.unwrap();
        sink.inject(Fault::Fail(SinkError::Transport("connection reset".into())));

        let summary = loader.run(&store, &CancellationToken::new()).await.unwrap();

        assert_eq!(loader.state(), LoaderState::Completed);
        assert_eq!(summary.failed_groups, vec!["genres".to_string()]);
        assert_eq!(summary.total_imported(), 1);
        let snapshot = sink.snapshot().unwrap();
        assert!(snapshot.vertices.contains_key("movie-1"));
        assert!(!snapshot.vertices.contains_key("genre-1"));
    }

    #[tokio::test]
    async fn test_cancellation_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());
        store
            .write_vertices(
                VertexKind::Genre,
                &[VertexDescriptor::new("genre-1", VertexKind::Genre)],
            )
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut loader = BulkLoader::new(MemorySink::new("movies"), options());

        let err = loader.run(&store, &cancel).await.unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(loader.state(), LoaderState::Failed);
    }

    #[tokio::test]
    async fn test_cancel_during_group_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());
        let genres: Vec<_> = (0..3)
            .map(|i| VertexDescriptor::new(format!("genre-{i}"), VertexKind::Genre))
            .collect();
        store.write_vertices(VertexKind::Genre, &genres).unwrap();

        let sink = MemorySink::new("movies");
        let mut loader = BulkLoader::new(
            sink.clone(),
            LoadOptions {
                throughput: 1,
                batch_size: 1,
                max_concurrency: 1,
                ..options()
            },
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = loader.run(&store, &cancel).await.unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(loader.state(), LoaderState::Failed);
        assert_eq!(sink.document_count(), 1);
        assert!(loader.summary().groups.is_empty());
    }
}
