//! Load command handler.

use color_eyre::Result;

use crate::config::SinkBackend;
use crate::context::Context;
use crate::graph::BulkSink;
use crate::loader::{BulkLoader, CancellationToken, LoadOptions, RunSummary};
use crate::store::IntermediateStore;

use super::App;

impl App {
    /// Run the bulk load into the configured backend.
    pub async fn run_load(&self) -> Result<()> {
        let ctx = Context::load()?;
        let store = ctx.store();
        let mut options = ctx.load_options();

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling the in-flight group");
                on_interrupt.cancel();
            }
        });

        let summary = match ctx.config.store.backend {
            SinkBackend::Postgres => {
                tracing::info!(
                    graph = %ctx.config.store.graph_name(),
                    "Loading into PostgreSQL + AGE"
                );
                load_into(ctx.postgres_sink()?, options, &store, &cancel).await?
            }
            SinkBackend::Memory => {
                // A fresh in-process store never has the collection yet
                options.cleanup_on_start = true;
                tracing::info!("Loading into in-memory store");
                load_into(ctx.memory_sink(), options, &store, &cancel).await?
            }
        };

        tracing::info!(
            imported = summary.total_imported(),
            failed_groups = summary.failed_groups.len(),
            "Load finished"
        );
        Ok(())
    }
}

async fn load_into<S: BulkSink>(
    sink: S,
    options: LoadOptions,
    store: &IntermediateStore,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    let mut loader = BulkLoader::new(sink, options);
    Ok(loader.run(store, cancel).await?)
}
