//! Intermediate store: projected groups as JSON array files.
//!
//! Layout under the data root: `Vertices/<kind>.json` and
//! `Edges/<relation>.json`. A file that already exists is never overwritten,
//! so a stage can be re-run after a failed load without redoing its output.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::AppError;
use crate::models::{EdgeDescriptor, VertexDescriptor, VertexKind};
use crate::projection::ProjectedGraph;
use crate::synth::Relation;

pub const VERTICES_DIR: &str = "Vertices";
pub const EDGES_DIR: &str = "Edges";

/// What a write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The target already existed and was left untouched.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct IntermediateStore {
    root: PathBuf,
}

impl IntermediateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vertex_path(&self, kind: VertexKind) -> PathBuf {
        self.root
            .join(VERTICES_DIR)
            .join(format!("{}.json", kind.file_stem()))
    }

    pub fn edge_path(&self, relation: Relation) -> PathBuf {
        self.root
            .join(EDGES_DIR)
            .join(format!("{}.json", relation.file_stem()))
    }

    pub fn write_vertices(
        &self,
        kind: VertexKind,
        vertices: &[VertexDescriptor],
    ) -> Result<WriteOutcome, AppError> {
        write_if_absent(&self.vertex_path(kind), vertices)
    }

    pub fn write_edges(
        &self,
        relation: Relation,
        edges: &[EdgeDescriptor],
    ) -> Result<WriteOutcome, AppError> {
        write_if_absent(&self.edge_path(relation), edges)
    }

    /// Reads a vertex group; `None` when the file was never generated.
    pub fn read_vertices(&self, kind: VertexKind) -> Result<Option<Vec<VertexDescriptor>>, AppError> {
        read_if_present(&self.vertex_path(kind))
    }

    pub fn read_edges(&self, relation: Relation) -> Result<Option<Vec<EdgeDescriptor>>, AppError> {
        read_if_present(&self.edge_path(relation))
    }

    /// True when every listed group file exists.
    pub fn all_present(&self, kinds: &[VertexKind], relations: &[Relation]) -> bool {
        kinds.iter().all(|k| self.vertex_path(*k).exists())
            && relations.iter().all(|r| self.edge_path(*r).exists())
    }

    /// Writes the listed groups of `graph`. Groups with no entries are still
    /// written (as `[]`) so the stage counts as generated.
    pub fn write_groups(
        &self,
        graph: &ProjectedGraph,
        kinds: &[VertexKind],
        relations: &[Relation],
    ) -> Result<Vec<(PathBuf, WriteOutcome)>, AppError> {
        let mut outcomes = Vec::with_capacity(kinds.len() + relations.len());
        for kind in kinds {
            let outcome = self.write_vertices(*kind, graph.vertices_of(*kind))?;
            outcomes.push((self.vertex_path(*kind), outcome));
        }
        for relation in relations {
            let outcome = self.write_edges(*relation, graph.edges_of(*relation))?;
            outcomes.push((self.edge_path(*relation), outcome));
        }
        Ok(outcomes)
    }
}

/// Serializes `items` to `path` unless it exists.
///
/// Writes go to a temporary file in the same directory and are persisted
/// without clobbering, so a concurrent or earlier writer always wins.
fn write_if_absent<T: Serialize>(path: &Path, items: &[T]) -> Result<WriteOutcome, AppError> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "output exists, not overwriting");
        return Ok(WriteOutcome::Skipped);
    }
    let dir = path
        .parent()
        .ok_or_else(|| AppError::Internal(format!("no parent directory for {}", path.display())))?;
    fs::create_dir_all(dir).map_err(|e| AppError::io(dir, e))?;

    let tmp = NamedTempFile::new_in(dir).map_err(|e| AppError::io(dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer(&mut writer, items)?;
        writer.flush().map_err(|e| AppError::io(path, e))?;
    }

    match tmp.persist_noclobber(path) {
        Ok(_) => {
            tracing::info!(path = %path.display(), count = items.len(), "wrote group");
            Ok(WriteOutcome::Written)
        }
        Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Ok(WriteOutcome::Skipped)
        }
        Err(err) => Err(AppError::io(path, err.error)),
    }
}

fn read_if_present<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, AppError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(AppError::io(path, err)),
    };
    let items = serde_json::from_reader(BufReader::new(file))?;
    Ok(Some(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());

        let first = vec![VertexDescriptor::new("genre-1", VertexKind::Genre).with("name", "Drama")];
        let second = vec![VertexDescriptor::new("genre-2", VertexKind::Genre)];

        assert_eq!(
            store.write_vertices(VertexKind::Genre, &first).unwrap(),
            WriteOutcome::Written
        );
        let before = fs::read(store.vertex_path(VertexKind::Genre)).unwrap();

        assert_eq!(
            store.write_vertices(VertexKind::Genre, &second).unwrap(),
            WriteOutcome::Skipped
        );
        let after = fs::read(store.vertex_path(VertexKind::Genre)).unwrap();
        assert_eq!(before, after);

        let read = store.read_vertices(VertexKind::Genre).unwrap().unwrap();
        assert_eq!(read, first);
    }

    #[test]
    fn test_layout_and_missing_groups() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());

        assert!(store
            .vertex_path(VertexKind::Movie)
            .ends_with("Vertices/movies.json"));
        assert!(store
            .edge_path(Relation::Genre)
            .ends_with("Edges/movieGenreEdges.json"));
        assert!(store.read_edges(Relation::Cast).unwrap().is_none());
    }

    #[test]
    fn test_write_groups_marks_stage_present() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntermediateStore::new(dir.path());
        let graph = ProjectedGraph::default();
        let kinds = [VertexKind::Keyword];
        let relations = [Relation::Keyword];

        assert!(!store.all_present(&kinds, &relations));
        let outcomes = store.write_groups(&graph, &kinds, &relations).unwrap();
        assert!(outcomes.iter().all(|(_, o)| *o == WriteOutcome::Written));
        assert!(store.all_present(&kinds, &relations));
        assert_eq!(store.read_edges(Relation::Keyword).unwrap(), Some(vec![]));
    }
}
