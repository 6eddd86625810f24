//! In-process sink.
//!
//! Keeps every collection in memory, keyed by document id. Faults can be
//! queued to simulate throttling or failing writes; each queued fault is
//! consumed by the next `write_batch` call.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::SinkError;
use crate::graph::cost::estimate_batch_charge;
use crate::graph::retry::with_client_retries;
use crate::graph::{BulkSink, CollectionSpec, GraphDocument, RetryOptions};
use crate::models::{EdgeDescriptor, VertexDescriptor};

/// A queued failure for the next write.
#[derive(Debug, Clone)]
pub enum Fault {
    Throttle { retry_after: Option<Duration> },
    Fail(SinkError),
}

#[derive(Debug, Clone)]
pub struct MemoryCollection {
    pub spec: CollectionSpec,
    pub vertices: IndexMap<String, VertexDescriptor>,
    pub edges: IndexMap<String, EdgeDescriptor>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: Mutex<HashMap<String, MemoryCollection>>,
    faults: Mutex<VecDeque<Fault>>,
    write_calls: AtomicUsize,
}

/// In-memory [`BulkSink`]. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MemorySink {
    state: Arc<MemoryState>,
    collection: Arc<str>,
    retry: RetryOptions,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemorySink {
    pub fn new(collection: &str) -> Self {
        Self {
            state: Arc::default(),
            collection: Arc::from(collection),
            retry: RetryOptions::default(),
        }
    }

    /// Queues a fault for an upcoming write.
    pub fn inject(&self, fault: Fault) {
        lock(&self.state.faults).push_back(fault);
    }

    /// Number of `write_batch` attempts, including faulted ones.
    pub fn write_calls(&self) -> usize {
        self.state.write_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the targeted collection.
    pub fn snapshot(&self) -> Option<MemoryCollection> {
        lock(&self.state.collections).get(&*self.collection).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.snapshot()
            .map_or(0, |c| c.vertices.len() + c.edges.len())
    }

    fn write_once(&self, docs: &[GraphDocument], upsert: bool) -> Result<f64, SinkError> {
        self.state.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = lock(&self.state.faults).pop_front() {
            return Err(match fault {
                Fault::Throttle { retry_after } => SinkError::Throttled { retry_after },
                Fault::Fail(err) => err,
            });
        }

        let mut collections = lock(&self.state.collections);
        let collection = collections
            .get_mut(&*self.collection)
            .ok_or_else(|| SinkError::CollectionNotFound(self.collection.to_string()))?;

        if !upsert {
            if let Some(doc) = docs.iter().find(|doc| match doc {
                GraphDocument::Vertex(v) => collection.vertices.contains_key(&v.id),
                GraphDocument::Edge(e) => collection.edges.contains_key(&e.id),
            }) {
                return Err(SinkError::Rejected {
                    id: doc.id().to_string(),
                    reason: "document already exists".into(),
                });
            }
        }

        for doc in docs {
            if doc.id().is_empty() {
                return Err(SinkError::MissingId);
            }
            match doc {
                GraphDocument::Vertex(v) => {
                    collection.vertices.insert(v.id.clone(), v.clone());
                }
                GraphDocument::Edge(e) => {
                    collection.edges.insert(e.id.clone(), e.clone());
                }
            }
        }
        Ok(estimate_batch_charge(docs))
    }
}

#[async_trait]
impl BulkSink for MemorySink {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn retry_options(&self) -> RetryOptions {
        self.retry
    }

    fn with_retry_options(&self, options: RetryOptions) -> Self {
        Self {
            retry: options,
            ..self.clone()
        }
    }

    async fn collection_exists(&self) -> Result<bool, SinkError> {
        Ok(lock(&self.state.collections).contains_key(&*self.collection))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), SinkError> {
        let mut collections = lock(&self.state.collections);
        if collections.contains_key(&*self.collection) {
            return Err(SinkError::Rejected {
                id: self.collection.to_string(),
                reason: "collection already exists".into(),
            });
        }
        collections.insert(
            self.collection.to_string(),
            MemoryCollection {
                spec: spec.clone(),
                vertices: IndexMap::new(),
                edges: IndexMap::new(),
            },
        );
        Ok(())
    }

    async fn drop_collection(&self) -> Result<(), SinkError> {
        lock(&self.state.collections).remove(&*self.collection);
        Ok(())
    }

    async fn provisioned_throughput(&self) -> Result<u32, SinkError> {
        lock(&self.state.collections)
            .get(&*self.collection)
            .map(|c| c.spec.throughput)
            .ok_or_else(|| SinkError::CollectionNotFound(self.collection.to_string()))
    }

    async fn write_batch(&self, docs: &[GraphDocument], upsert: bool) -> Result<f64, SinkError> {
        with_client_retries(&self.retry, || async { self.write_once(docs, upsert) }).await
    }
}
