//! Destination graph store access.
//!
//! # Architecture
//!
//! - [`BulkSink`] - one collection of a graph store, with client-level retries
//! - [`BulkExecutor`] - the bulk-write capability: batching, parallelism,
//!   throughput pacing and the executor-owned throttle backoff
//! - [`backends`] - PostgreSQL + Apache AGE, and an in-memory store
//!
//! # Usage
//!
//! ```ignore
//! use moviegraph::graph::{BulkExecutor, BulkImportOptions};
//!
//! let executor = BulkExecutor::initialize(&sink).await?;
//! let response = executor
//!     .bulk_import(documents, &BulkImportOptions::default(), &cancel)
//!     .await?;
//! ```

mod document;
mod executor;
mod retry;
mod traits;

pub mod backends;
pub mod cost;

pub use document::GraphDocument;
pub use executor::{pacing_delay, BulkExecutor, BulkImportOptions, BulkImportResponse};
pub use retry::{with_client_retries, BackoffPolicy, RetryOptions};
pub use traits::{BulkSink, CollectionSpec};
