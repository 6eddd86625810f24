//! Keyword projection.

use super::{Projector, RecordProjection};
use crate::decode::{decode_list, scalar};
use crate::dedup::EntityRegistry;
use crate::models::{KeywordDoc, KeywordsRow, VertexDescriptor, VertexKind};
use crate::naming::namespace;
use crate::synth::Relation;

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordsProjector;

impl Projector for KeywordsProjector {
    type Record = KeywordsRow;

    fn project(&self, registry: &mut EntityRegistry, row: KeywordsRow) -> RecordProjection {
        let Some(raw_id) = scalar::text(row.id.as_deref()) else {
            tracing::warn!("keywords row without movie id, skipping");
            return RecordProjection::rejected();
        };
        let movie_id = namespace(VertexKind::Movie, &raw_id);
        let mut out = RecordProjection::default();

        let keywords = match decode_list::<KeywordDoc>(row.keywords.as_deref()) {
            Ok(keywords) => keywords,
            Err(err) => {
                tracing::warn!(movie = %movie_id, field = "keywords", %err, "skipping nested field");
                out.field_failed("keywords");
                return out;
            }
        };

        for keyword in keywords {
            let key = keyword.id.trim();
            if key.is_empty() {
                continue;
            }
            let id = namespace(VertexKind::Keyword, key);
            out.vertex_if_new(
                registry,
                VertexDescriptor::new(&id, VertexKind::Keyword)
                    .with("name", keyword.name.unwrap_or_default()),
            );
            out.relationship(Relation::Keyword, Relation::Keyword.forward(&movie_id, &id));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_pairs() {
        let mut registry = EntityRegistry::new();
        let row = KeywordsRow {
            id: Some("862".into()),
            keywords: Some("[{'id': 931, 'name': 'jealousy'}, {'id': 4290, 'name': 'toy'}]".into()),
        };
        let out = KeywordsProjector.project(&mut registry, row);

        assert_eq!(out.vertices.len(), 2);
        assert_eq!(out.edges.len(), 4);
        assert!(out.edges.iter().all(|(_, e)| e.label == "movieKeyword"));
        assert_eq!(out.edges[1].1.from_id, "keyword-931");
        assert_eq!(out.edges[1].1.to_id, "movie-862");
    }

    #[test]
    fn test_empty_keyword_list() {
        let mut registry = EntityRegistry::new();
        let row = KeywordsRow {
            id: Some("1".into()),
            keywords: Some("[]".into()),
        };
        let out = KeywordsProjector.project(&mut registry, row);
        assert!(out.vertices.is_empty());
        assert!(out.edges.is_empty());
        assert!(!out.rejected);
    }
}
