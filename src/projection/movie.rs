//! Movie metadata projection.
//!
//! One movie vertex per row, plus the sub-entities referenced by the nested
//! metadata fields. Each nested field is decoded on its own; a broken field
//! only loses its own sub-entities.

use serde::de::DeserializeOwned;

use super::{Projector, RecordProjection};
use crate::decode::scalar::{self, MIN_DATE};
use crate::decode::{decode_list, decode_optional};
use crate::dedup::EntityRegistry;
use crate::models::{
    CollectionDoc, CompanyDoc, CountryDoc, GenreDoc, LanguageDoc, MovieMetadataRow,
    VertexDescriptor, VertexKind,
};
use crate::naming::namespace;
use crate::synth::Relation;

#[derive(Debug, Default, Clone, Copy)]
pub struct MovieProjector;

impl Projector for MovieProjector {
    type Record = MovieMetadataRow;

    fn project(&self, registry: &mut EntityRegistry, row: MovieMetadataRow) -> RecordProjection {
        let Some(raw_id) = scalar::text(row.id.as_deref()) else {
            tracing::warn!(title = ?row.title, "metadata row without movie id, skipping");
            return RecordProjection::rejected();
        };
        let movie_id = namespace(VertexKind::Movie, &raw_id);

        let mut out = RecordProjection::default();
        out.vertex_if_new(registry, movie_vertex(&movie_id, &row));

        match decode_optional::<CollectionDoc>(row.belongs_to_collection.as_deref()) {
            Ok(Some(doc)) if !doc.id.trim().is_empty() => {
                let id = namespace(VertexKind::Collection, doc.id.trim());
                out.vertex_if_new(
                    registry,
                    VertexDescriptor::new(&id, VertexKind::Collection)
                        .with("name", doc.name.unwrap_or_default())
                        .with("backdropPath", doc.backdrop_path.unwrap_or_default())
                        .with("posterPath", doc.poster_path.unwrap_or_default()),
                );
                out.relationship(
                    Relation::BelongsToCollection,
                    Relation::BelongsToCollection.forward(&movie_id, &id),
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(movie = %movie_id, field = "belongs_to_collection", %err, "skipping nested field");
                out.field_failed("belongs_to_collection");
            }
        }

        nested_list::<GenreDoc>(
            registry,
            &mut out,
            &movie_id,
            "genres",
            row.genres.as_deref(),
            Relation::Genre,
            |doc| (doc.id.clone(), doc.name.clone()),
        );
        nested_list::<LanguageDoc>(
            registry,
            &mut out,
            &movie_id,
            "spoken_languages",
            row.spoken_languages.as_deref(),
            Relation::Language,
            |doc| (doc.iso_639_1.clone(), doc.name.clone()),
        );
        nested_list::<CompanyDoc>(
            registry,
            &mut out,
            &movie_id,
            "production_companies",
            row.production_companies.as_deref(),
            Relation::ProducedBy,
            |doc| (doc.id.clone(), doc.name.clone()),
        );
        nested_list::<CountryDoc>(
            registry,
            &mut out,
            &movie_id,
            "production_countries",
            row.production_countries.as_deref(),
            Relation::ProducedIn,
            |doc| (doc.iso_3166_1.clone(), doc.name.clone()),
        );

        out
    }
}

/// Builds the movie vertex with sentinels for every absent value.
///
/// `isAdult` and `isVideo` are left out when unknown.
fn movie_vertex(id: &str, row: &MovieMetadataRow) -> VertexDescriptor {
    let text = |raw: &Option<String>| scalar::text(raw.as_deref()).unwrap_or_default();

    let mut vertex = VertexDescriptor::new(id, VertexKind::Movie).with("title", text(&row.title));
    if let Some(adult) = scalar::parse_bool(row.adult.as_deref()) {
        vertex = vertex.with("isAdult", adult);
    }
    vertex = vertex
        .with("budget", scalar::parse_i64(row.budget.as_deref()).unwrap_or(-1))
        .with("homepage", text(&row.homepage))
        .with("imdbId", text(&row.imdb_id))
        .with("originalLanguage", text(&row.original_language))
        .with("originalTitle", text(&row.original_title))
        .with("overview", text(&row.overview))
        .with(
            "popularity",
            scalar::parse_f64(row.popularity.as_deref()).unwrap_or(-1.0),
        )
        .with("posterPath", text(&row.poster_path))
        .with(
            "releaseDate",
            scalar::parse_date(row.release_date.as_deref()).unwrap_or_else(|| MIN_DATE.to_string()),
        )
        .with("revenue", scalar::parse_i64(row.revenue.as_deref()).unwrap_or(-1))
        .with("runtime", scalar::parse_f64(row.runtime.as_deref()).unwrap_or(-1.0))
        .with("status", text(&row.status))
        .with("tagline", text(&row.tagline));
    if let Some(video) = scalar::parse_bool(row.video.as_deref()) {
        vertex = vertex.with("isVideo", video);
    }
    vertex
        .with(
            "voteAverage",
            scalar::parse_f64(row.vote_average.as_deref()).unwrap_or(-1.0),
        )
        .with(
            "voteCount",
            scalar::parse_i64(row.vote_count.as_deref()).unwrap_or(-1),
        )
}

/// Decodes one nested list field into `name`-only vertices linked from the movie.
///
/// `key_and_name` extracts the raw entity key and display name of an entry.
fn nested_list<T: DeserializeOwned>(
    registry: &mut EntityRegistry,
    out: &mut RecordProjection,
    movie_id: &str,
    field: &'static str,
    raw: Option<&str>,
    relation: Relation,
    key_and_name: impl Fn(&T) -> (String, Option<String>),
) {
    let docs = match decode_list::<T>(raw) {
        Ok(docs) => docs,
        Err(err) => {
            tracing::warn!(movie = %movie_id, field, %err, "skipping nested field");
            out.field_failed(field);
            return;
        }
    };

    let (_, kind) = relation.endpoints();
    for doc in &docs {
        let (key, name) = key_and_name(doc);
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let id = namespace(kind, key);
        out.vertex_if_new(
            registry,
            VertexDescriptor::new(&id, kind).with("name", name.unwrap_or_default()),
        );
        out.relationship(relation, relation.forward(movie_id, &id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyValue;

    fn row(id: &str) -> MovieMetadataRow {
        MovieMetadataRow {
            id: Some(id.to_string()),
            ..MovieMetadataRow::default()
        }
    }

    #[test]
    fn test_movie_with_single_genre() {
        let mut registry = EntityRegistry::new();
        let record = MovieMetadataRow {
            genres: Some(r#"[{"id":1,"name":"Drama"}]"#.to_string()),
            ..row("42")
        };

        let out = MovieProjector.project(&mut registry, record);

        assert_eq!(out.vertices.len(), 2);
        assert_eq!(out.vertices[0].id, "movie-42");
        assert_eq!(out.vertices[1].id, "genre-1");
        assert_eq!(
            out.vertices[1].property("name"),
            Some(&PropertyValue::from("Drama"))
        );

        let edges: Vec<_> = out
            .edges
            .iter()
            .map(|(_, e)| (e.label.as_str(), e.from_id.as_str(), e.to_id.as_str()))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("movieGenre", "movie-42", "genre-1"),
                ("movieGenre", "genre-1", "movie-42"),
            ]
        );
    }

    #[test]
    fn test_sentinels_for_absent_values() {
        let mut registry = EntityRegistry::new();
        let out = MovieProjector.project(&mut registry, row("7"));
        let movie = &out.vertices[0];

        assert_eq!(movie.property("budget"), Some(&PropertyValue::Int(-1)));
        assert_eq!(movie.property("revenue"), Some(&PropertyValue::Int(-1)));
        assert_eq!(movie.property("voteCount"), Some(&PropertyValue::Int(-1)));
        assert_eq!(movie.property("popularity"), Some(&PropertyValue::Float(-1.0)));
        assert_eq!(movie.property("runtime"), Some(&PropertyValue::Float(-1.0)));
        assert_eq!(movie.property("voteAverage"), Some(&PropertyValue::Float(-1.0)));
        assert_eq!(movie.property("title"), Some(&PropertyValue::from("")));
        assert_eq!(
            movie.property("releaseDate"),
            Some(&PropertyValue::from(MIN_DATE))
        );
        assert_eq!(movie.property("isAdult"), None);
        assert_eq!(movie.property("isVideo"), None);
    }

    #[test]
    fn test_parsed_values() {
        let mut registry = EntityRegistry::new();
        let record = MovieMetadataRow {
            adult: Some("False".into()),
            budget: Some("30000000".into()),
            popularity: Some("21.946943".into()),
            release_date: Some("1995-10-30".into()),
            title: Some("Toy Story".into()),
            video: Some("False".into()),
            ..row("862")
        };
        let out = MovieProjector.project(&mut registry, record);
        let movie = &out.vertices[0];

        assert_eq!(movie.property("isAdult"), Some(&PropertyValue::Bool(false)));
        assert_eq!(movie.property("budget"), Some(&PropertyValue::Int(30_000_000)));
        assert_eq!(
            movie.property("popularity"),
            Some(&PropertyValue::Float(21.946943))
        );
        assert_eq!(
            movie.property("releaseDate"),
            Some(&PropertyValue::from("1995-10-30T00:00:00Z"))
        );
    }

    #[test]
    fn test_malformed_field_only_drops_its_sub_entities() {
        let mut registry = EntityRegistry::new();
        let record = MovieMetadataRow {
            genres: Some(r#"[{"id":1,"name":"Drama"}]"#.into()),
            production_companies: Some("[{'name': 'Pixar', 'id': 3".into()),
            production_countries: Some("[{'iso_3166_1': 'US', 'name': 'United States of America'}]".into()),
            ..row("42")
        };
        let out = MovieProjector.project(&mut registry, record);

        assert_eq!(out.failed_fields, vec!["production_companies"]);
        let ids: Vec<_> = out.vertices.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["movie-42", "genre-1", "country-US"]);
        assert!(out.edges.iter().all(|(r, _)| *r != Relation::ProducedBy));
        assert_eq!(
            out.edges
                .iter()
                .filter(|(r, _)| *r == Relation::ProducedIn)
                .count(),
            2
        );
    }

    #[test]
    fn test_collection_membership_is_one_way() {
        let mut registry = EntityRegistry::new();
        let record = MovieMetadataRow {
            belongs_to_collection: Some(
                "{'id': 10194, 'name': 'Toy Story Collection', 'poster_path': '/p.jpg', 'backdrop_path': None}".into(),
            ),
            ..row("862")
        };
        let out = MovieProjector.project(&mut registry, record);

        let collection = &out.vertices[1];
        assert_eq!(collection.id, "collection-10194");
        assert_eq!(collection.property("backdropPath"), Some(&PropertyValue::from("")));
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].1.label, "belongsToCollection");
    }

    #[test]
    fn test_shared_entities_are_emitted_once() {
        let mut registry = EntityRegistry::new();
        let genres = Some(r#"[{"id":18,"name":"Drama"}]"#.to_string());
        let first = MovieProjector.project(
            &mut registry,
            MovieMetadataRow {
                genres: genres.clone(),
                ..row("1")
            },
        );
        let second = MovieProjector.project(&mut registry, MovieMetadataRow { genres, ..row("2") });

        assert_eq!(first.vertices.len(), 2);
        assert_eq!(second.vertices.len(), 1);
        assert_eq!(second.edges.len(), 2);
    }

    #[test]
    fn test_row_without_id_is_rejected() {
        let mut registry = EntityRegistry::new();
        let out = MovieProjector.project(&mut registry, MovieMetadataRow::default());
        assert!(out.rejected);
        assert!(out.vertices.is_empty());
    }
}
