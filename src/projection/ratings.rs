//! Ratings and users.
//!
//! Ratings rows are positional: `userId,movieId,rating,timestamp`. A row whose
//! timestamp is not an integer is reported and dropped; the rest of the file
//! is still read.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use ::csv::{Reader, StringRecord};

use super::{Projector, RecordProjection};
use crate::decode::{open_reader, read_rows, RowOutcome};
use crate::dedup::EntityRegistry;
use crate::error::AppError;
use crate::models::{LinkRow, RatingRow, VertexDescriptor, VertexKind};
use crate::naming::namespace;
use crate::synth::Relation;

/// Decodes the data rows of a ratings file. The header row is skipped.
pub fn read_ratings<R: Read>(reader: Reader<R>) -> impl Iterator<Item = RowOutcome<RatingRow>> {
    reader.into_records().map(|result| match result {
        Ok(record) => decode_rating(&record),
        Err(err) => RowOutcome::Malformed {
            line: err.position().map(|p| p.line()).unwrap_or(0),
            reason: err.to_string(),
        },
    })
}

fn decode_rating(record: &StringRecord) -> RowOutcome<RatingRow> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let malformed = |reason: String| RowOutcome::Malformed { line, reason };

    let field = |i: usize| record.get(i).map(str::trim).filter(|s| !s.is_empty());
    let (Some(user_id), Some(movie_id), Some(rating), Some(timestamp)) =
        (field(0), field(1), field(2), field(3))
    else {
        return malformed(format!("expected 4 fields, got {}", record.len()));
    };
    match timestamp.parse::<i64>() {
        Ok(timestamp) => RowOutcome::Row(RatingRow {
            user_id: user_id.to_string(),
            movie_id: movie_id.to_string(),
            rating: rating.to_string(),
            timestamp,
        }),
        Err(err) => malformed(format!("invalid timestamp {timestamp:?}: {err}")),
    }
}

/// MovieLens movie id to TMDB id, from `links.csv`.
#[derive(Debug, Default, Clone)]
pub struct LinkTable {
    tmdb_by_movie: HashMap<String, String>,
}

impl LinkTable {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let table = Self::from_rows(read_rows::<LinkRow, _>(open_reader(path)?)?);
        tracing::info!(path = %path.display(), links = table.len(), "loaded movie links");
        Ok(table)
    }

    pub fn from_rows(rows: impl IntoIterator<Item = RowOutcome<LinkRow>>) -> Self {
        let mut tmdb_by_movie = HashMap::new();
        for row in rows {
            let RowOutcome::Row(link) = row else { continue };
            let movie = link.movie_id.as_deref().map(str::trim).unwrap_or_default();
            let tmdb = link.tmdb_id.as_deref().map(str::trim).unwrap_or_default();
            if !movie.is_empty() && !tmdb.is_empty() {
                tmdb_by_movie.insert(movie.to_string(), tmdb.to_string());
            }
        }
        Self { tmdb_by_movie }
    }

    /// TMDB id for `movie_id`, or `movie_id` itself when unlinked.
    pub fn resolve<'a>(&'a self, movie_id: &'a str) -> &'a str {
        self.tmdb_by_movie.get(movie_id).map_or(movie_id, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tmdb_by_movie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tmdb_by_movie.is_empty()
    }
}

/// One `rated` edge per ratings row.
#[derive(Debug, Default, Clone)]
pub struct RatingsProjector {
    links: Option<LinkTable>,
}

impl RatingsProjector {
    pub fn new(links: Option<LinkTable>) -> Self {
        Self { links }
    }

    fn movie_key<'a>(&'a self, movie_id: &'a str) -> &'a str {
        match &self.links {
            Some(links) => links.resolve(movie_id),
            None => movie_id,
        }
    }
}

impl Projector for RatingsProjector {
    type Record = RatingRow;

    fn project(&self, _registry: &mut EntityRegistry, row: RatingRow) -> RecordProjection {
        let user_id = namespace(VertexKind::User, &row.user_id);
        let movie_id = namespace(VertexKind::Movie, self.movie_key(&row.movie_id));

        let mut out = RecordProjection::default();
        out.relationship(
            Relation::Rated,
            Relation::Rated
                .forward(&user_id, &movie_id)
                .with("rating", row.rating)
                .with("timestamp", row.timestamp),
        );
        out
    }
}

/// One user vertex per distinct rater.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserProjector;

impl Projector for UserProjector {
    type Record = RatingRow;

    fn project(&self, registry: &mut EntityRegistry, row: RatingRow) -> RecordProjection {
        let mut out = RecordProjection::default();
        out.vertex_if_new(
            registry,
            VertexDescriptor::new(namespace(VertexKind::User, &row.user_id), VertexKind::User)
                .with("name", row.user_id),
        );
        out
    }
}
