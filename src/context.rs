//! Application context shared by the CLI commands.

use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::graph::backends::memory::MemorySink;
use crate::graph::backends::postgres::PostgresSink;
use crate::loader::LoadOptions;
use crate::pipeline::ProjectionPipeline;
use crate::store::IntermediateStore;

/// Holds the resolved configuration and builds the components of a run.
#[derive(Clone)]
pub struct Context {
    pub config: Arc<Config>,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Loads the layered configuration.
    pub fn load() -> Result<Self, AppError> {
        Ok(Self::new(Config::load()?))
    }

    pub fn pipeline(&self) -> ProjectionPipeline {
        ProjectionPipeline::new(self.config.data.clone())
    }

    pub fn store(&self) -> IntermediateStore {
        IntermediateStore::new(&self.config.data.root)
    }

    pub fn load_options(&self) -> LoadOptions {
        let store = &self.config.store;
        let load = &self.config.load;
        LoadOptions {
            database: store.database.clone(),
            collection: store.collection.clone(),
            partition_key: store.partition_key.clone(),
            throughput: store.throughput,
            cleanup_on_start: load.cleanup_on_start,
            cleanup_on_finish: load.cleanup_on_finish,
            batch_size: load.batch_size,
            max_concurrency: load.max_concurrency,
            validate_edges: load.validate_edges,
        }
    }

    pub fn postgres_sink(&self) -> Result<PostgresSink, AppError> {
        let store = &self.config.store;
        let sink = PostgresSink::connect(&store.uri, store.credential.as_deref(), &store.graph_name())?
            .with_partition_key(store.partition_key_property());
        Ok(sink)
    }

    pub fn memory_sink(&self) -> MemorySink {
        MemorySink::new(&self.config.store.graph_name())
    }
}
