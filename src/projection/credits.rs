//! Cast and crew projection.

use super::labels::crew_label;
use super::{Projector, RecordProjection};
use crate::decode::{decode_list, scalar};
use crate::dedup::EntityRegistry;
use crate::models::{CastMemberDoc, CreditsRow, CrewMemberDoc, VertexDescriptor, VertexKind};
use crate::naming::namespace;
use crate::synth::Relation;

#[derive(Debug, Default, Clone, Copy)]
pub struct CreditsProjector;

impl Projector for CreditsProjector {
    type Record = CreditsRow;

    fn project(&self, registry: &mut EntityRegistry, row: CreditsRow) -> RecordProjection {
        let Some(raw_id) = scalar::text(row.id.as_deref()) else {
            tracing::warn!("credits row without movie id, skipping");
            return RecordProjection::rejected();
        };
        let movie_id = namespace(VertexKind::Movie, &raw_id);
        let mut out = RecordProjection::default();

        match decode_list::<CastMemberDoc>(row.cast.as_deref()) {
            Ok(cast) => {
                for member in cast {
                    let Some(person_id) = person(registry, &mut out, &member.id, || {
                        (member.name.clone(), member.gender, member.profile_path.clone())
                    }) else {
                        continue;
                    };
                    let edge = Relation::Cast
                        .forward(&person_id, &movie_id)
                        .with("character", member.character.unwrap_or_default())
                        .with("creditId", member.credit_id.unwrap_or_default())
                        .with("order", member.order.unwrap_or(-1));
                    out.relationship(Relation::Cast, edge);
                }
            }
            Err(err) => {
                tracing::warn!(movie = %movie_id, field = "cast", %err, "skipping nested field");
                out.field_failed("cast");
            }
        }

        match decode_list::<CrewMemberDoc>(row.crew.as_deref()) {
            Ok(crew) => {
                for member in crew {
                    let Some(person_id) = person(registry, &mut out, &member.id, || {
                        (member.name.clone(), member.gender, member.profile_path.clone())
                    }) else {
                        continue;
                    };
                    let label = crew_label(member.job.as_deref(), member.department.as_deref());
                    let edge = Relation::Crew
                        .forward_labeled(&label, &person_id, &movie_id)
                        .with("department", member.department.unwrap_or_default())
                        .with("creditId", member.credit_id.unwrap_or_default());
                    out.relationship(Relation::Crew, edge);
                }
            }
            Err(err) => {
                tracing::warn!(movie = %movie_id, field = "crew", %err, "skipping nested field");
                out.field_failed("crew");
            }
        }

        out
    }
}

/// Emits the person vertex on first sight and returns its id.
///
/// `details` is only evaluated for new persons.
fn person(
    registry: &mut EntityRegistry,
    out: &mut RecordProjection,
    raw_id: &str,
    details: impl FnOnce() -> (Option<String>, Option<i64>, Option<String>),
) -> Option<String> {
    let raw_id = raw_id.trim();
    if raw_id.is_empty() {
        return None;
    }
    let id = namespace(VertexKind::Person, raw_id);
    if !registry.seen(VertexKind::Person, &id) {
        let (name, gender, profile_path) = details();
        out.vertex_if_new(
            registry,
            VertexDescriptor::new(&id, VertexKind::Person)
                .with("name", name.unwrap_or_default())
                .with("gender", gender.unwrap_or(-1))
                .with("profilePath", profile_path.unwrap_or_default()),
        );
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyValue;

    const CAST: &str = "[{'cast_id': 14, 'character': 'Woody (voice)', 'credit_id': '52fe4284c3a36847f8024f95', 'gender': 2, 'id': 31, 'name': 'Tom Hanks', 'order': 0, 'profile_path': '/pQFoyx7rp09CJTAb932F2g8Nlho.jpg'}]";

    fn credits(cast: &str, crew: &str) -> CreditsRow {
        CreditsRow {
            cast: Some(cast.to_string()),
            crew: Some(crew.to_string()),
            id: Some("862".to_string()),
        }
    }

    #[test]
    fn test_cast_pair_carries_credit_properties() {
        let mut registry = EntityRegistry::new();
        let out = CreditsProjector.project(&mut registry, credits(CAST, "[]"));

        assert_eq!(out.vertices.len(), 1);
        let person = &out.vertices[0];
        assert_eq!(person.id, "person-31");
        assert_eq!(person.property("name"), Some(&PropertyValue::from("Tom Hanks")));
        assert_eq!(person.property("gender"), Some(&PropertyValue::Int(2)));

        assert_eq!(out.edges.len(), 2);
        let (_, forward) = &out.edges[0];
        let (_, inverse) = &out.edges[1];
        assert_eq!(forward.label, "actedIn");
        assert_eq!(forward.from_id, "person-31");
        assert_eq!(forward.to_id, "movie-862");
        assert_eq!(inverse.label, "cast");
        assert_eq!(inverse.from_id, "movie-862");
        assert_eq!(
            inverse.properties.get("character"),
            Some(&PropertyValue::from("Woody (voice)"))
        );
        assert_eq!(inverse.properties.get("order"), Some(&PropertyValue::Int(0)));
    }

    #[test]
    fn test_crew_labels_follow_job_then_department() {
        let crew = r#"[
            {"id": 7879, "job": "Director", "department": "Directing", "credit_id": "a"},
            {"id": 12, "job": null, "department": "Sound", "credit_id": "b"},
            {"id": 13, "credit_id": "c"}
        ]"#;
        let mut registry = EntityRegistry::new();
        let out = CreditsProjector.project(&mut registry, credits("[]", crew));

        let labels: Vec<_> = out.edges.iter().map(|(_, e)| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["director", "director", "sound", "sound", "crewMember", "crewMember"]
        );
        assert_eq!(
            out.edges[0].1.properties.get("department"),
            Some(&PropertyValue::from("Directing"))
        );
        assert_eq!(out.edges[1].1.to_id, "person-7879");
    }

    #[test]
    fn test_person_in_cast_and_crew_is_one_vertex() {
        let crew = r#"[{"id": 31, "job": "Producer", "department": "Production"}]"#;
        let mut registry = EntityRegistry::new();
        let out = CreditsProjector.project(&mut registry, credits(CAST, crew));

        assert_eq!(out.vertices.len(), 1);
        assert_eq!(out.edges.len(), 4);

        let again = CreditsProjector.project(&mut registry, credits(CAST, crew));
        assert!(again.vertices.is_empty());
        assert_eq!(again.edges.len(), 4);
    }

    #[test]
    fn test_broken_cast_keeps_crew() {
        let crew = r#"[{"id": 5, "job": "Editor"}]"#;
        let mut registry = EntityRegistry::new();
        let out = CreditsProjector.project(&mut registry, credits("[{'id': ", crew));

        assert_eq!(out.failed_fields, vec!["cast"]);
        assert_eq!(out.vertices.len(), 1);
        assert_eq!(out.edges[0].1.label, "editor");
    }
}
