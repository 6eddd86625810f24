//! Source records as decoded from the movie dataset.
//!
//! Outer rows carry every column as optional raw text; nested sub-documents
//! (genres, cast, crew, ...) stay opaque until a projector decodes them.

use serde::{Deserialize, Deserializer};

/// One row of `movies_metadata.csv`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MovieMetadataRow {
    pub adult: Option<String>,
    pub belongs_to_collection: Option<String>,
    pub budget: Option<String>,
    pub genres: Option<String>,
    pub homepage: Option<String>,
    pub id: Option<String>,
    pub imdb_id: Option<String>,
    pub original_language: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub popularity: Option<String>,
    pub poster_path: Option<String>,
    pub production_companies: Option<String>,
    pub production_countries: Option<String>,
    pub release_date: Option<String>,
    pub revenue: Option<String>,
    pub runtime: Option<String>,
    pub spoken_languages: Option<String>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub title: Option<String>,
    pub video: Option<String>,
    pub vote_average: Option<String>,
    pub vote_count: Option<String>,
}

/// One row of `credits.csv`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreditsRow {
    pub cast: Option<String>,
    pub crew: Option<String>,
    pub id: Option<String>,
}

/// One row of `keywords.csv`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeywordsRow {
    pub id: Option<String>,
    pub keywords: Option<String>,
}

/// One row of `links.csv` (MovieLens id to TMDB id).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkRow {
    pub movie_id: Option<String>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<String>,
}

/// One data row of a ratings file.
///
/// Ratings rows are positional (`userId,movieId,rating,timestamp`) and are
/// decoded by the ratings projector directly from CSV fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRow {
    pub user_id: String,
    pub movie_id: String,
    /// Kept verbatim, never reinterpreted.
    pub rating: String,
    pub timestamp: i64,
}

// ----------------------------------------------------------------------------
// Nested sub-documents
// ----------------------------------------------------------------------------

/// `belongs_to_collection` sub-document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionDoc {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

/// Entry of the `genres` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenreDoc {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Entry of the `production_companies` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompanyDoc {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Entry of the `production_countries` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountryDoc {
    pub iso_3166_1: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Entry of the `spoken_languages` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LanguageDoc {
    pub iso_639_1: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Entry of a movie's `keywords` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordDoc {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Entry of a movie's `cast` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastMemberDoc {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub credit_id: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub gender: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Entry of a movie's `crew` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrewMemberDoc {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub credit_id: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub gender: Option<i64>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Accepts ids written either as JSON numbers or strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v.to_string()),
        Raw::Float(v) if v.fract() == 0.0 => Ok(format!("{}", v as i64)),
        Raw::Float(v) => Ok(v.to_string()),
        Raw::Text(s) => Ok(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let genres: Vec<GenreDoc> =
            serde_json::from_str(r#"[{"id": 18, "name": "Drama"}, {"id": "35", "name": "Comedy"}]"#)
                .unwrap();
        assert_eq!(genres[0].id, "18");
        assert_eq!(genres[1].id, "35");
    }

    #[test]
    fn test_cast_member_optional_fields() {
        let cast: Vec<CastMemberDoc> =
            serde_json::from_str(r#"[{"id": 31, "name": "Tom Hanks", "profile_path": null}]"#)
                .unwrap();
        assert_eq!(cast[0].id, "31");
        assert_eq!(cast[0].order, None);
        assert_eq!(cast[0].profile_path, None);
    }
}
