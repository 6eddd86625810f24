//! Bulk-write capability on top of a [`BulkSink`].
//!
//! The executor splits a group into batches, writes them with bounded
//! parallelism, paces itself to the collection's provisioned throughput and
//! retries throttled batches with exponential backoff. It is the only retry
//! layer on its write path: the sink handle it writes through has client
//! retries disabled.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use ulid::Ulid;

use super::cost::estimate_batch_charge;
use super::{BackoffPolicy, BulkSink, GraphDocument, RetryOptions};
use crate::error::SinkError;
use crate::loader::CancellationToken;

/// Throttle retries per batch before the batch fails.
const DEFAULT_MAX_THROTTLE_RETRIES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkImportOptions {
    /// Overwrite documents whose id already exists.
    pub upsert: bool,
    /// Assign ids to documents that have none. When off, such documents fail the group.
    pub auto_generate_id: bool,
    pub max_concurrency: usize,
    pub batch_size: usize,
}

impl Default for BulkImportOptions {
    fn default() -> Self {
        Self {
            upsert: true,
            auto_generate_id: false,
            max_concurrency: 4,
            batch_size: 1000,
        }
    }
}

/// Outcome of one [`BulkExecutor::bulk_import`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BulkImportResponse {
    pub imported: u64,
    pub elapsed: Duration,
    pub consumed_ru: f64,
    pub batches: usize,
    /// Throttled attempts absorbed by backoff.
    pub throttled: u32,
}

pub struct BulkExecutor<S: BulkSink> {
    sink: S,
    throughput: u32,
    backoff: BackoffPolicy,
    max_throttle_retries: u32,
}

impl<S: BulkSink> BulkExecutor<S> {
    /// Initializes the capability against `sink`'s collection.
    ///
    /// Initialization calls go through a handle with the raised
    /// [`RetryOptions::initialization`] budget to ride out startup throttling.
    /// Writes then use a handle with client retries disabled.
    pub async fn initialize(sink: &S) -> Result<Self, SinkError> {
        let init = sink.with_retry_options(RetryOptions::initialization());
        if !init.collection_exists().await? {
            return Err(SinkError::CollectionNotFound(init.collection().to_string()));
        }
        let throughput = init.provisioned_throughput().await?;

        let writer = sink.with_retry_options(RetryOptions::disabled());
        tracing::info!(
            collection = writer.collection(),
            throughput,
            "bulk executor initialized"
        );
        Ok(Self {
            sink: writer,
            throughput,
            backoff: BackoffPolicy::default(),
            max_throttle_retries: DEFAULT_MAX_THROTTLE_RETRIES,
        })
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy, max_throttle_retries: u32) -> Self {
        self.backoff = backoff;
        self.max_throttle_retries = max_throttle_retries;
        self
    }

    pub fn throughput(&self) -> u32 {
        self.throughput
    }

    /// The write handle. Its client retries are disabled.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Imports one group of documents.
    ///
    /// Fails on the first batch that cannot be written; batches written
    /// before that stay written. Cancelling `cancel` aborts the call.
    pub async fn bulk_import(
        &self,
        docs: Vec<GraphDocument>,
        options: &BulkImportOptions,
        cancel: &CancellationToken,
    ) -> Result<BulkImportResponse, SinkError> {
        if cancel.is_cancelled() {
            return Err(SinkError::Cancelled);
        }
        let started = Instant::now();
        let docs = prepare_ids(docs, options.auto_generate_id)?;
        let batches = into_batches(docs, options.batch_size);
        let governor = Governor::new(self.throughput);

        let import = async {
            let mut writes = stream::iter(
                batches
                    .into_iter()
                    .map(|batch| self.write_with_backoff(batch, options.upsert, &governor)),
            )
            .buffer_unordered(options.max_concurrency.max(1));

            let mut response = BulkImportResponse::default();
            while let Some(outcome) = writes.next().await {
                let outcome = outcome?;
                response.imported += outcome.imported;
                response.consumed_ru += outcome.charge;
                response.throttled += outcome.throttled;
                response.batches += 1;
            }
            Ok::<_, SinkError>(response)
        };

        let mut response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SinkError::Cancelled),
            result = import => result?,
        };
        response.elapsed = started.elapsed();
        Ok(response)
    }

    async fn write_with_backoff(
        &self,
        batch: Vec<GraphDocument>,
        upsert: bool,
        governor: &Governor,
    ) -> Result<BatchOutcome, SinkError> {
        let estimate = estimate_batch_charge(&batch);
        governor.acquire(estimate).await;

        let mut attempt = 0;
        loop {
            match self.sink.write_batch(&batch, upsert).await {
                Ok(charge) => {
                    governor.settle(estimate, charge);
                    return Ok(BatchOutcome {
                        imported: batch.len() as u64,
                        charge,
                        throttled: attempt,
                    });
                }
                Err(err) if err.is_throttle() && attempt < self.max_throttle_retries => {
                    let delay = self.backoff.delay(attempt, err.retry_after());
                    tracing::debug!(attempt, ?delay, size = batch.len(), "batch throttled, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

struct BatchOutcome {
    imported: u64,
    charge: f64,
    throttled: u32,
}

fn prepare_ids(
    mut docs: Vec<GraphDocument>,
    auto_generate_id: bool,
) -> Result<Vec<GraphDocument>, SinkError> {
    for doc in &mut docs {
        if doc.id().is_empty() {
            if !auto_generate_id {
                return Err(SinkError::MissingId);
            }
            doc.set_id(Ulid::new().to_string());
        }
    }
    Ok(docs)
}

fn into_batches(docs: Vec<GraphDocument>, batch_size: usize) -> Vec<Vec<GraphDocument>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(docs.len().div_ceil(batch_size));
    let mut iter = docs.into_iter().peekable();
    while iter.peek().is_some() {
        batches.push(iter.by_ref().take(batch_size).collect());
    }
    batches
}

/// Keeps consumed RU per elapsed second within the provisioned budget.
struct Governor {
    budget: f64,
    started: Instant,
    spent: Mutex<f64>,
}

impl Governor {
    fn new(throughput: u32) -> Self {
        Self {
            budget: f64::from(throughput),
            started: Instant::now(),
            spent: Mutex::new(0.0),
        }
    }

    /// Reserves `cost` RU, waiting until the RU already spent fits the budget.
    async fn acquire(&self, cost: f64) {
        let delay = {
            let mut spent = self.spent.lock().unwrap_or_else(|e| e.into_inner());
            let delay = pacing_delay(*spent, self.budget, self.started.elapsed());
            *spent += cost;
            delay
        };
        if !delay.is_zero() {
            tracing::debug!(?delay, "pacing to provisioned throughput");
            tokio::time::sleep(delay).await;
        }
    }

    /// Replaces a reservation's estimate with the charge actually reported.
    fn settle(&self, estimate: f64, actual: f64) {
        let mut spent = self.spent.lock().unwrap_or_else(|e| e.into_inner());
        *spent += actual - estimate;
    }
}

/// How long to wait before `spent` RU fit into `budget` RU/s after `elapsed`.
pub fn pacing_delay(spent: f64, budget: f64, elapsed: Duration) -> Duration {
    if budget <= 0.0 || spent <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(spent / budget).saturating_sub(elapsed)
}
