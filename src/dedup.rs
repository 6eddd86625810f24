//! Per-run registry of vertex ids already emitted.

use std::collections::{HashMap, HashSet};

use crate::models::VertexKind;

/// Tracks which namespaced ids have been emitted as vertices, per kind.
///
/// The first projector to [`try_add`](EntityRegistry::try_add) an id owns the
/// vertex; later occurrences only reference it from edges.
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    seen: HashMap<VertexKind, HashSet<String>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, kind: VertexKind, id: &str) -> bool {
        self.seen.get(&kind).is_some_and(|ids| ids.contains(id))
    }

    /// Records `id` and returns true if this is its first occurrence.
    pub fn try_add(&mut self, kind: VertexKind, id: &str) -> bool {
        let ids = self.seen.entry(kind).or_default();
        if ids.contains(id) {
            false
        } else {
            ids.insert(id.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_add_reports_first_occurrence_only() {
        let mut registry = EntityRegistry::new();
        assert!(registry.try_add(VertexKind::Genre, "genre-1"));
        assert!(!registry.try_add(VertexKind::Genre, "genre-1"));
        assert!(registry.try_add(VertexKind::Genre, "genre-2"));
        assert!(registry.seen(VertexKind::Genre, "genre-2"));
    }

    #[test]
    fn test_kinds_are_tracked_separately() {
        let mut registry = EntityRegistry::new();
        assert!(registry.try_add(VertexKind::Person, "x"));
        assert!(registry.seen(VertexKind::Person, "x"));
        assert!(!registry.seen(VertexKind::User, "x"));
        assert!(registry.try_add(VertexKind::User, "x"));
    }
}
