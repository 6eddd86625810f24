//! Throughput accounting for a load run.

use std::time::Duration;

use serde::Serialize;

use crate::graph::BulkImportResponse;

/// Throughput figures of one imported group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub group: String,
    pub imported: u64,
    pub elapsed: Duration,
    pub consumed_ru: f64,
}

impl BatchSummary {
    pub fn from_response(group: &str, response: &BulkImportResponse) -> Self {
        Self {
            group: group.to_string(),
            imported: response.imported,
            elapsed: response.elapsed,
            consumed_ru: response.consumed_ru,
        }
    }

    /// Documents per second, rounded.
    pub fn writes_per_second(&self) -> f64 {
        per_second(self.imported as f64, self.elapsed)
    }

    /// RU per second, rounded.
    pub fn ru_per_second(&self) -> f64 {
        per_second(self.consumed_ru, self.elapsed)
    }

    pub fn average_ru_per_document(&self) -> f64 {
        if self.imported == 0 {
            0.0
        } else {
            self.consumed_ru / self.imported as f64
        }
    }
}

fn per_second(amount: f64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        0.0
    } else {
        (amount / secs).round()
    }
}

/// Accumulated figures of a whole run.
///
/// Averages are taken over the groups that completed; failed groups only
/// show up in [`failed_groups`](Self::failed_groups).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub groups: Vec<BatchSummary>,
    pub failed_groups: Vec<String>,
    /// Edges dropped because an endpoint had no vertex.
    pub dangling_edges: usize,
    pub total_elapsed: Duration,
}

impl RunSummary {
    pub fn record(&mut self, batch: BatchSummary) {
        self.groups.push(batch);
    }

    pub fn record_failure(&mut self, group: &str) {
        self.failed_groups.push(group.to_string());
    }

    pub fn total_imported(&self) -> u64 {
        self.groups.iter().map(|g| g.imported).sum()
    }

    pub fn total_ru(&self) -> f64 {
        self.groups.iter().map(|g| g.consumed_ru).sum()
    }

    pub fn average_writes_per_second(&self) -> f64 {
        self.average(BatchSummary::writes_per_second)
    }

    pub fn average_ru_per_second(&self) -> f64 {
        self.average(BatchSummary::ru_per_second)
    }

    fn average(&self, metric: impl Fn(&BatchSummary) -> f64) -> f64 {
        if self.groups.is_empty() {
            return 0.0;
        }
        let total: f64 = self.groups.iter().map(metric).sum();
        (total / self.groups.len() as f64).round()
    }

    /// Emits the run summary as a log event.
    pub fn log(&self) {
        tracing::info!(
            total_imported = self.total_imported(),
            avg_writes_per_sec = self.average_writes_per_second(),
            avg_ru_per_sec = self.average_ru_per_second(),
            total_ru = self.total_ru(),
            total_secs = self.total_elapsed.as_secs_f64(),
            failed_groups = self.failed_groups.len(),
            dangling_edges = self.dangling_edges,
            "load summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(imported: u64, secs: u64, ru: f64) -> BatchSummary {
        BatchSummary {
            group: "movies".into(),
            imported,
            elapsed: Duration::from_secs(secs),
            consumed_ru: ru,
        }
    }

    #[test]
    fn test_batch_rates() {
        let summary = batch(1000, 10, 40_000.0);
        assert_eq!(summary.writes_per_second(), 100.0);
        assert_eq!(summary.ru_per_second(), 4000.0);
        assert_eq!(summary.average_ru_per_document(), 40.0);
    }

    #[test]
    fn test_zero_elapsed_and_empty_batches() {
        let summary = batch(0, 0, 0.0);
        assert_eq!(summary.writes_per_second(), 0.0);
        assert_eq!(summary.average_ru_per_document(), 0.0);
    }

    #[test]
    fn test_run_averages_exclude_failed_groups() {
        let mut run = RunSummary::default();
        run.record(batch(1000, 10, 40_000.0));
        run.record(batch(300, 1, 1_500.0));
        run.record_failure("castEdges");

        assert_eq!(run.total_imported(), 1300);
        assert_eq!(run.total_ru(), 41_500.0);
        assert_eq!(run.average_writes_per_second(), 200.0);
        assert_eq!(run.average_ru_per_second(), 2750.0);
        assert_eq!(run.failed_groups, vec!["castEdges".to_string()]);
    }
}
