//! Namespaced vertex identifiers.
//!
//! Every id is `<kind-prefix>-<raw key>`. Prefixes are distinct per kind and
//! none contains the delimiter, so two different `(kind, key)` pairs can never
//! produce the same id.

use crate::models::VertexKind;

pub const DELIMITER: char = '-';

impl VertexKind {
    /// Fixed id prefix for this kind.
    pub fn id_prefix(&self) -> &'static str {
        self.as_str()
    }
}

/// Derives the namespaced id for a raw entity key.
///
/// An empty `raw_key` still yields a well-formed id; callers skip such keys.
pub fn namespace(kind: VertexKind, raw_key: &str) -> String {
    let prefix = kind.id_prefix();
    let mut id = String::with_capacity(prefix.len() + 1 + raw_key.len());
    id.push_str(prefix);
    id.push(DELIMITER);
    id.push_str(raw_key);
    id
}
