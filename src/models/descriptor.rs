//! Vertex and edge descriptors produced by projection and consumed by the loader.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Entity kinds that become vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexKind {
    Movie,
    Person,
    Genre,
    Keyword,
    Country,
    Company,
    Language,
    Collection,
    User,
}

impl VertexKind {
    pub const ALL: [VertexKind; 9] = [
        VertexKind::Movie,
        VertexKind::Person,
        VertexKind::Genre,
        VertexKind::Keyword,
        VertexKind::Country,
        VertexKind::Company,
        VertexKind::Language,
        VertexKind::Collection,
        VertexKind::User,
    ];

    /// Vertex label in the destination store.
    pub fn as_str(&self) -> &'static str {
        match self {
            VertexKind::Movie => "movie",
            VertexKind::Person => "person",
            VertexKind::Genre => "genre",
            VertexKind::Keyword => "keyword",
            VertexKind::Country => "country",
            VertexKind::Company => "company",
            VertexKind::Language => "language",
            VertexKind::Collection => "collection",
            VertexKind::User => "user",
        }
    }

    /// Interchange file stem under `Vertices/`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            VertexKind::Movie => "movies",
            VertexKind::Person => "persons",
            VertexKind::Genre => "genres",
            VertexKind::Keyword => "keywords",
            VertexKind::Country => "countries",
            VertexKind::Company => "companies",
            VertexKind::Language => "languages",
            VertexKind::Collection => "collections",
            VertexKind::User => "users",
        }
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar property value.
///
/// Serialized untagged so the interchange files carry plain JSON scalars.
/// Variant order matters for deserialization: integers must be tried before
/// floats so `-1` stays an integer and `-1.0` stays a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// Insertion-ordered property map.
pub type Properties = IndexMap<String, PropertyValue>;

/// A vertex ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexDescriptor {
    /// Namespaced id, unique across the run.
    pub id: String,
    pub kind: VertexKind,
    #[serde(default)]
    pub properties: Properties,
}

impl VertexDescriptor {
    pub fn new(id: impl Into<String>, kind: VertexKind) -> Self {
        Self {
            id: id.into(),
            kind,
            properties: Properties::new(),
        }
    }

    /// Adds a property, builder style.
    pub fn with(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// A directed, labeled edge ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescriptor {
    /// Synthetic id with no meaning beyond uniqueness.
    pub id: String,
    pub label: String,
    pub from_id: String,
    pub to_id: String,
    pub from_kind: VertexKind,
    pub to_kind: VertexKind,
    pub from_partition_key: String,
    pub to_partition_key: String,
    #[serde(default)]
    pub properties: Properties,
}

impl EdgeDescriptor {
    /// Creates an edge with a fresh id. Partition keys default to the endpoint ids.
    pub fn new(
        label: impl Into<String>,
        from: (&str, VertexKind),
        to: (&str, VertexKind),
    ) -> Self {
        Self {
            id: generate_edge_id(),
            label: label.into(),
            from_id: from.0.to_string(),
            to_id: to.0.to_string(),
            from_kind: from.1,
            to_kind: to.1,
            from_partition_key: from.0.to_string(),
            to_partition_key: to.0.to_string(),
            properties: Properties::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// The edge with its id blanked, for comparing runs structurally.
    pub fn without_id(&self) -> Self {
        Self {
            id: String::new(),
            ..self.clone()
        }
    }
}

/// Generates a new edge id.
pub fn generate_edge_id() -> String {
    Ulid::new().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_json_shapes() {
        let mut props = Properties::new();
        props.insert("budget".into(), PropertyValue::Int(-1));
        props.insert("popularity".into(), PropertyValue::Float(-1.0));
        props.insert("isAdult".into(), PropertyValue::Bool(false));
        props.insert("title".into(), PropertyValue::from("Heat"));

        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(
            json,
            r#"{"budget":-1,"popularity":-1.0,"isAdult":false,"title":"Heat"}"#
        );

        let back: Properties = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("budget"), Some(&PropertyValue::Int(-1)));
        assert_eq!(back.get("popularity"), Some(&PropertyValue::Float(-1.0)));
        let keys: Vec<_> = back.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["budget", "popularity", "isAdult", "title"]);
    }

    #[test]
    fn test_edge_ids_are_unique_and_partition_keys_follow_endpoints() {
        let a = EdgeDescriptor::new(
            "movieGenre",
            ("movie-42", VertexKind::Movie),
            ("genre-1", VertexKind::Genre),
        );
        let b = EdgeDescriptor::new(
            "movieGenre",
            ("movie-42", VertexKind::Movie),
            ("genre-1", VertexKind::Genre),
        );
        assert_ne!(a.id, b.id);
        assert_eq!(a.without_id(), b.without_id());
        assert_eq!(a.from_partition_key, "movie-42");
        assert_eq!(a.to_partition_key, "genre-1");
    }

    #[test]
    fn test_edge_serializes_camel_case() {
        let edge = EdgeDescriptor::new(
            "rated",
            ("user-1", VertexKind::User),
            ("movie-31", VertexKind::Movie),
        );
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["fromId"], "user-1");
        assert_eq!(value["toKind"], "movie");
        assert_eq!(value["fromPartitionKey"], "user-1");
    }
}
