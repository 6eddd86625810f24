//! Graph projection: decoded records to vertex and edge descriptors.
//!
//! One [`Projector`] per source entity type. Projectors are stateless; the
//! per-run state (which entities already became vertices, and everything
//! projected so far) lives in a [`ProjectionContext`] passed in by the caller.

pub mod credits;
pub mod keywords;
pub mod labels;
pub mod movie;
pub mod ratings;

use std::collections::BTreeMap;

use crate::dedup::EntityRegistry;
use crate::models::{EdgeDescriptor, VertexDescriptor, VertexKind};
use crate::synth::{EdgeSynthesizer, Relation};

pub use credits::CreditsProjector;
pub use keywords::KeywordsProjector;
pub use movie::MovieProjector;
pub use ratings::{LinkTable, RatingsProjector, UserProjector};

/// Projects one source record into graph descriptors.
pub trait Projector {
    type Record;

    /// Projects a single record. Vertices are only emitted for entities the
    /// registry has not seen yet; edges are always emitted.
    fn project(&self, registry: &mut EntityRegistry, record: Self::Record) -> RecordProjection;
}

/// What one record contributed.
#[derive(Debug, Default, Clone)]
pub struct RecordProjection {
    pub vertices: Vec<VertexDescriptor>,
    pub edges: Vec<(Relation, EdgeDescriptor)>,
    /// Sub-fields whose nested documents failed to decode and were skipped.
    pub failed_fields: Vec<&'static str>,
    /// The record as a whole was unusable.
    pub rejected: bool,
}

impl RecordProjection {
    pub fn rejected() -> Self {
        Self {
            rejected: true,
            ..Self::default()
        }
    }

    /// Emits `vertex` unless its id was already registered for its kind.
    pub fn vertex_if_new(&mut self, registry: &mut EntityRegistry, vertex: VertexDescriptor) {
        if registry.try_add(vertex.kind, &vertex.id) {
            self.vertices.push(vertex);
        }
    }

    /// Emits the forward edge and, for bidirectional relations, its inverse.
    pub fn relationship(&mut self, relation: Relation, forward: EdgeDescriptor) {
        self.edges.extend(
            EdgeSynthesizer::synthesize(relation, forward)
                .into_iter()
                .map(|edge| (relation, edge)),
        );
    }

    pub fn field_failed(&mut self, field: &'static str) {
        self.failed_fields.push(field);
    }
}

/// Everything projected, grouped by vertex kind and edge relation.
///
/// Order within each group follows source-record order.
#[derive(Debug, Default, Clone)]
pub struct ProjectedGraph {
    pub vertices: BTreeMap<VertexKind, Vec<VertexDescriptor>>,
    pub edges: BTreeMap<Relation, Vec<EdgeDescriptor>>,
}

impl ProjectedGraph {
    fn absorb(&mut self, projection: RecordProjection) {
        for vertex in projection.vertices {
            self.vertices.entry(vertex.kind).or_default().push(vertex);
        }
        for (relation, edge) in projection.edges {
            self.edges.entry(relation).or_default().push(edge);
        }
    }

    pub fn vertices_of(&self, kind: VertexKind) -> &[VertexDescriptor] {
        self.vertices.get(&kind).map_or(&[], Vec::as_slice)
    }

    pub fn edges_of(&self, relation: Relation) -> &[EdgeDescriptor] {
        self.edges.get(&relation).map_or(&[], Vec::as_slice)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.values().map(Vec::len).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

/// Counters for one projection stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub records: usize,
    pub rejected: usize,
    pub failed_fields: usize,
    pub vertices: usize,
    pub edges: usize,
}

/// Per-run projection state: the entity registry and the accumulated graph.
#[derive(Debug, Default)]
pub struct ProjectionContext {
    registry: EntityRegistry,
    graph: ProjectedGraph,
}

/// Progress is logged every this many records.
const PROGRESS_INTERVAL: usize = 10_000;

impl ProjectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &ProjectedGraph {
        &self.graph
    }

    /// Projects a single record and keeps its output.
    pub fn apply<P: Projector>(&mut self, projector: &P, record: P::Record) -> StageReport {
        let projection = projector.project(&mut self.registry, record);
        let report = StageReport {
            records: 1,
            rejected: usize::from(projection.rejected),
            failed_fields: projection.failed_fields.len(),
            vertices: projection.vertices.len(),
            edges: projection.edges.len(),
        };
        self.graph.absorb(projection);
        report
    }

    /// Projects every record of a stage.
    pub fn run<P, I>(&mut self, stage: &str, projector: &P, records: I) -> StageReport
    where
        P: Projector,
        I: IntoIterator<Item = P::Record>,
    {
        let mut total = StageReport::default();
        for record in records {
            total.merge(self.apply(projector, record));
            if total.records % PROGRESS_INTERVAL == 0 {
                tracing::info!(stage, processed = total.records, "projection progress");
            }
        }
        total
    }

    /// Hands over the graph projected so far, keeping the registry so later
    /// stages still see earlier entities.
    pub fn take_graph(&mut self) -> ProjectedGraph {
        std::mem::take(&mut self.graph)
    }

    /// Ends the run and returns everything projected.
    pub fn finalize(self) -> ProjectedGraph {
        self.graph
    }
}

impl StageReport {
    pub fn merge(&mut self, other: StageReport) {
        self.records += other.records;
        self.rejected += other.rejected;
        self.failed_fields += other.failed_fields;
        self.vertices += other.vertices;
        self.edges += other.edges;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GenreOnly;

    impl Projector for GenreOnly {
        type Record = (&'static str, &'static str);

        fn project(&self, registry: &mut EntityRegistry, record: Self::Record) -> RecordProjection {
            let (movie, genre) = record;
            let mut out = RecordProjection::default();
            out.vertex_if_new(registry, VertexDescriptor::new(genre, VertexKind::Genre));
            out.relationship(Relation::Genre, Relation::Genre.forward(movie, genre));
            out
        }
    }

    #[test]
    fn test_context_dedups_across_records() {
        let mut ctx = ProjectionContext::new();
        let report = ctx.run(
            "genres",
            &GenreOnly,
            vec![("movie-1", "genre-1"), ("movie-2", "genre-1")],
        );

        assert_eq!(report.records, 2);
        assert_eq!(report.vertices, 1);
        assert_eq!(report.edges, 4);

        let graph = ctx.finalize();
        assert_eq!(graph.vertices_of(VertexKind::Genre).len(), 1);
        assert_eq!(graph.edges_of(Relation::Genre).len(), 4);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_take_graph_keeps_registry() {
        let mut ctx = ProjectionContext::new();
        ctx.apply(&GenreOnly, ("movie-1", "genre-1"));
        let first = ctx.take_graph();
        assert_eq!(first.vertex_count(), 1);

        ctx.apply(&GenreOnly, ("movie-2", "genre-1"));
        assert_eq!(ctx.graph().vertex_count(), 0);
        assert_eq!(ctx.graph().edge_count(), 2);
        assert!(ctx.registry().seen(VertexKind::Genre, "genre-1"));
    }
}
