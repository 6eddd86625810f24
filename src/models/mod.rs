//! Domain models: decoded source records and projected graph descriptors.

mod descriptor;
mod records;

pub use descriptor::{
    generate_edge_id, EdgeDescriptor, Properties, PropertyValue, VertexDescriptor, VertexKind,
};
pub use records::{
    CastMemberDoc, CollectionDoc, CompanyDoc, CountryDoc, CreditsRow, CrewMemberDoc, GenreDoc,
    KeywordDoc, KeywordsRow, LanguageDoc, LinkRow, MovieMetadataRow, RatingRow,
};
