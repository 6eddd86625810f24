//! Request-unit estimates for backends that do not report their own.

use super::GraphDocument;

/// Flat charge for any document write.
pub const BASE_WRITE_CHARGE: f64 = 5.0;
/// Additional charge per started KiB of serialized document.
pub const CHARGE_PER_KIB: f64 = 1.0;

/// Estimated RU cost of writing one document.
pub fn estimate_write_charge(doc: &GraphDocument) -> f64 {
    let bytes = serde_json::to_vec(doc).map(|b| b.len()).unwrap_or(0);
    BASE_WRITE_CHARGE + CHARGE_PER_KIB * bytes.div_ceil(1024) as f64
}

/// Estimated RU cost of a batch.
pub fn estimate_batch_charge(docs: &[GraphDocument]) -> f64 {
    docs.iter().map(estimate_write_charge).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VertexDescriptor, VertexKind};

    #[test]
    fn test_small_document_costs_base_plus_one_kib() {
        let doc = GraphDocument::from(VertexDescriptor::new("genre-1", VertexKind::Genre));
        assert_eq!(estimate_write_charge(&doc), 6.0);
    }

    #[test]
    fn test_charge_grows_per_started_kib() {
        let doc = GraphDocument::from(
            VertexDescriptor::new("movie-1", VertexKind::Movie).with("overview", "x".repeat(2048)),
        );
        assert_eq!(estimate_write_charge(&doc), 8.0);
        assert_eq!(estimate_batch_charge(&[doc.clone(), doc]), 16.0);
    }
}
