//! Relation catalogue and inverse-edge synthesis.
//!
//! Relations traversed from both endpoints are stored twice: the forward edge
//! and an inverse edge with swapped endpoints. The inverse label is either the
//! same as the forward one, a fixed counterpart, or (for crew credits) the
//! label computed for the forward edge.

use crate::models::{EdgeDescriptor, VertexKind};

/// How the inverse edge of a relation is labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPolicy {
    /// No inverse edge is emitted.
    Forward,
    /// Inverse carries the forward label.
    Symmetric,
    /// Inverse carries a fixed, distinct label.
    Asymmetric { inverse: &'static str },
    /// Label is derived per edge from source data; the inverse reuses it.
    Dynamic,
}

/// Edge datasets produced by projection. Each maps to one interchange file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    BelongsToCollection,
    Cast,
    Crew,
    Keyword,
    Genre,
    Language,
    ProducedBy,
    ProducedIn,
    Rated,
}

impl Relation {
    pub const ALL: [Relation; 9] = [
        Relation::Rated,
        Relation::BelongsToCollection,
        Relation::Cast,
        Relation::Crew,
        Relation::Keyword,
        Relation::Genre,
        Relation::Language,
        Relation::ProducedBy,
        Relation::ProducedIn,
    ];

    /// Label of the forward edge. Crew labels are computed, see
    /// [`crate::projection::labels::crew_label`].
    pub fn forward_label(&self) -> &'static str {
        match self {
            Relation::BelongsToCollection => "belongsToCollection",
            Relation::Cast => "actedIn",
            Relation::Crew => "crewMember",
            Relation::Keyword => "movieKeyword",
            Relation::Genre => "movieGenre",
            Relation::Language => "movieLanguage",
            Relation::ProducedBy => "producedBy",
            Relation::ProducedIn => "producedIn",
            Relation::Rated => "rated",
        }
    }

    pub fn policy(&self) -> LabelPolicy {
        match self {
            Relation::BelongsToCollection | Relation::Rated => LabelPolicy::Forward,
            Relation::Cast => LabelPolicy::Asymmetric { inverse: "cast" },
            Relation::Crew => LabelPolicy::Dynamic,
            Relation::Keyword | Relation::Genre | Relation::Language => LabelPolicy::Symmetric,
            Relation::ProducedBy => LabelPolicy::Asymmetric {
                inverse: "producedMovie",
            },
            Relation::ProducedIn => LabelPolicy::Asymmetric {
                inverse: "productionCountry",
            },
        }
    }

    /// `(from, to)` kinds of the forward edge.
    pub fn endpoints(&self) -> (VertexKind, VertexKind) {
        match self {
            Relation::BelongsToCollection => (VertexKind::Movie, VertexKind::Collection),
            Relation::Cast | Relation::Crew => (VertexKind::Person, VertexKind::Movie),
            Relation::Keyword => (VertexKind::Movie, VertexKind::Keyword),
            Relation::Genre => (VertexKind::Movie, VertexKind::Genre),
            Relation::Language => (VertexKind::Movie, VertexKind::Language),
            Relation::ProducedBy => (VertexKind::Movie, VertexKind::Company),
            Relation::ProducedIn => (VertexKind::Movie, VertexKind::Country),
            Relation::Rated => (VertexKind::User, VertexKind::Movie),
        }
    }

    /// Interchange file stem under `Edges/`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Relation::BelongsToCollection => "belongsToCollectionEdges",
            Relation::Cast => "castEdges",
            Relation::Crew => "crewEdges",
            Relation::Keyword => "keywordEdges",
            Relation::Genre => "movieGenreEdges",
            Relation::Language => "movieLanguageEdges",
            Relation::ProducedBy => "producedByEdges",
            Relation::ProducedIn => "producedInEdges",
            Relation::Rated => "ratingEdges",
        }
    }

    pub fn is_bidirectional(&self) -> bool {
        self.policy() != LabelPolicy::Forward
    }

    /// Builds the forward edge of this relation with its fixed label.
    pub fn forward(&self, from_id: &str, to_id: &str) -> EdgeDescriptor {
        self.forward_labeled(self.forward_label(), from_id, to_id)
    }

    /// Builds the forward edge with an explicit label (crew credits).
    pub fn forward_labeled(&self, label: &str, from_id: &str, to_id: &str) -> EdgeDescriptor {
        let (from_kind, to_kind) = self.endpoints();
        EdgeDescriptor::new(label, (from_id, from_kind), (to_id, to_kind))
    }
}

/// Produces the edges stored for one relationship instance.
pub struct EdgeSynthesizer;

impl EdgeSynthesizer {
    /// The inverse of `forward` under `policy`, or `None` for one-way relations.
    ///
    /// The inverse swaps endpoints, kinds and partition keys, copies the
    /// properties, and gets its own id.
    pub fn inverse(forward: &EdgeDescriptor, policy: LabelPolicy) -> Option<EdgeDescriptor> {
        let label = match policy {
            LabelPolicy::Forward => return None,
            LabelPolicy::Symmetric | LabelPolicy::Dynamic => forward.label.clone(),
            LabelPolicy::Asymmetric { inverse } => inverse.to_string(),
        };

        Some(
            EdgeDescriptor::new(
                label,
                (&forward.to_id, forward.to_kind),
                (&forward.from_id, forward.from_kind),
            )
            .with_properties(forward.properties.clone()),
        )
    }

    /// Forward edge followed by its inverse where the relation has one.
    ///
    /// No deduplication: synthesizing the same relationship twice yields two pairs.
    pub fn synthesize(relation: Relation, forward: EdgeDescriptor) -> Vec<EdgeDescriptor> {
        let inverse = Self::inverse(&forward, relation.policy());
        let mut edges = Vec::with_capacity(2);
        edges.push(forward);
        edges.extend(inverse);
        edges
    }
}
