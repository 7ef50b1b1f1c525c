use std::collections::BTreeMap;
use std::time::Duration;

use tracing::warn;

use super::outcome::{FailureKind, FailureReason, WorkerOutcome, WorkerReport};

/// Success/failure counts. `successes + failures` equals the worker count once
/// the run is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    pub successes: u64,
    pub failures: u64,
}

impl RunTally {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.successes.saturating_add(self.failures)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub tally: RunTally,
    pub failures_by_kind: BTreeMap<FailureKind, u64>,
    pub total_attempts: u64,
    pub min_latency: Duration,
    pub avg_latency: Duration,
    pub max_latency: Duration,
    pub wall_time: Duration,
}

impl RunReport {
    #[must_use]
    pub fn failures_of(&self, kind: FailureKind) -> u64 {
        self.failures_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// Folds worker reports into a [`RunReport`].
///
/// Owned by the collector alone. Each worker index is counted once; a repeated
/// index is ignored and a missing one is counted as a failure at `finish`.
#[derive(Debug)]
pub struct Aggregator {
    seen: Vec<bool>,
    tally: RunTally,
    failures_by_kind: BTreeMap<FailureKind, u64>,
    total_attempts: u64,
    latency_sum: Duration,
    min_latency: Option<Duration>,
    max_latency: Duration,
    latency_samples: u32,
}

impl Aggregator {
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            seen: vec![false; workers],
            tally: RunTally::default(),
            failures_by_kind: BTreeMap::new(),
            total_attempts: 0,
            latency_sum: Duration::ZERO,
            min_latency: None,
            max_latency: Duration::ZERO,
            latency_samples: 0,
        }
    }

    pub fn record(&mut self, report: &WorkerReport) {
        match self.seen.get_mut(report.index) {
            Some(seen) if !*seen => *seen = true,
            Some(_) => {
                warn!("Ignoring repeated outcome for worker {}", report.index);
                return;
            }
            None => {
                warn!("Ignoring outcome for unknown worker {}", report.index);
                return;
            }
        }

        match &report.outcome {
            WorkerOutcome::Success { .. } => {
                self.tally.successes = self.tally.successes.saturating_add(1);
            }
            WorkerOutcome::Failure { reason } => self.count_failure(reason),
        }
        self.total_attempts = self
            .total_attempts
            .saturating_add(u64::from(report.attempts));
        self.latency_sum = self.latency_sum.saturating_add(report.elapsed);
        self.latency_samples = self.latency_samples.saturating_add(1);
        self.max_latency = self.max_latency.max(report.elapsed);
        self.min_latency = Some(
            self.min_latency
                .map_or(report.elapsed, |min| min.min(report.elapsed)),
        );
    }

    #[must_use]
    pub fn finish(mut self, wall_time: Duration) -> RunReport {
        let missing = self.seen.iter().filter(|seen| !**seen).count();
        if missing > 0 {
            warn!("{} worker(s) never reported; counting them as failed", missing);
            for _ in 0..missing {
                self.count_failure(&FailureReason::Panicked);
            }
        }

        let avg_latency = self
            .latency_sum
            .checked_div(self.latency_samples)
            .unwrap_or(Duration::ZERO);
        RunReport {
            tally: self.tally,
            failures_by_kind: self.failures_by_kind,
            total_attempts: self.total_attempts,
            min_latency: self.min_latency.unwrap_or(Duration::ZERO),
            avg_latency,
            max_latency: self.max_latency,
            wall_time,
        }
    }

    fn count_failure(&mut self, reason: &FailureReason) {
        self.tally.failures = self.tally.failures.saturating_add(1);
        let slot = self.failures_by_kind.entry(reason.kind()).or_insert(0);
        *slot = slot.saturating_add(1);
    }
}
