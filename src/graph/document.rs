//! Documents submitted to a sink.

use serde::{Deserialize, Serialize};

use crate::models::{EdgeDescriptor, VertexDescriptor};

/// A vertex or an edge, as handed to [`BulkSink::write_batch`](super::BulkSink::write_batch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphDocument {
    Vertex(VertexDescriptor),
    Edge(EdgeDescriptor),
}

impl GraphDocument {
    pub fn id(&self) -> &str {
        match self {
            GraphDocument::Vertex(v) => &v.id,
            GraphDocument::Edge(e) => &e.id,
        }
    }

    pub fn set_id(&mut self, id: String) {
        match self {
            GraphDocument::Vertex(v) => v.id = id,
            GraphDocument::Edge(e) => e.id = id,
        }
    }
}

impl From<VertexDescriptor> for GraphDocument {
    fn from(vertex: VertexDescriptor) -> Self {
        GraphDocument::Vertex(vertex)
    }
}

impl From<EdgeDescriptor> for GraphDocument {
    fn from(edge: EdgeDescriptor) -> Self {
        GraphDocument::Edge(edge)
    }
}
