//! Destination store abstraction.
//!
//! A [`BulkSink`] is a handle on one collection of a graph store. Handles are
//! cheap to clone and carry their own client-level [`RetryOptions`], so the
//! same store can be driven with different retry ownership from different
//! call paths.

use async_trait::async_trait;

use super::{GraphDocument, RetryOptions};
use crate::error::SinkError;

/// Provisioning parameters for a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    /// Partition-key path, e.g. `/pk`.
    pub partition_key: String,
    /// Provisioned throughput in RU/s.
    pub throughput: u32,
}

/// A graph store collection that accepts batched writes.
#[async_trait]
pub trait BulkSink: Clone + Send + Sync + 'static {
    /// Name of the collection this handle targets.
    fn collection(&self) -> &str;

    /// Client-level retry budget of this handle.
    fn retry_options(&self) -> RetryOptions;

    /// A handle on the same collection with a different retry budget.
    fn with_retry_options(&self, options: RetryOptions) -> Self;

    async fn collection_exists(&self) -> Result<bool, SinkError>;

    /// Creates the collection. Fails if it already exists.
    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), SinkError>;

    /// Drops the collection and everything in it. Missing collections are ignored.
    async fn drop_collection(&self) -> Result<(), SinkError>;

    /// Provisioned throughput of the collection in RU/s.
    async fn provisioned_throughput(&self) -> Result<u32, SinkError>;

    /// Writes one batch and returns the RU it consumed.
    ///
    /// With `upsert`, a document whose id already exists replaces it;
    /// otherwise the batch is rejected. Documents must carry ids.
    async fn write_batch(&self, docs: &[GraphDocument], upsert: bool) -> Result<f64, SinkError>;
}
