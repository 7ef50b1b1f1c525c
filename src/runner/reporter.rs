use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::error;

use super::outcome::{FailureReason, WorkerOutcome, WorkerReport};

/// A worker's one-shot handle to the collector.
///
/// `report` consumes the reporter, so a worker cannot report twice. If the
/// worker unwinds or is dropped before reporting, `Drop` sends a `Panicked`
/// failure in its place, so the collector always hears from every worker.
pub(crate) struct OutcomeReporter {
    index: usize,
    started: Instant,
    tx: Option<mpsc::Sender<WorkerReport>>,
}

impl OutcomeReporter {
    pub(crate) fn new(index: usize, tx: mpsc::Sender<WorkerReport>) -> Self {
        Self {
            index,
            started: Instant::now(),
            tx: Some(tx),
        }
    }

    pub(crate) fn report(mut self, outcome: WorkerOutcome, attempts: u32) {
        if let Some(tx) = self.tx.take() {
            self.deliver(&tx, outcome, attempts);
        }
    }

    fn deliver(&self, tx: &mpsc::Sender<WorkerReport>, outcome: WorkerOutcome, attempts: u32) {
        let report = WorkerReport {
            index: self.index,
            outcome,
            attempts,
            elapsed: self.started.elapsed(),
        };
        // Capacity equals the worker count and each worker sends once.
        if let Err(err) = tx.try_send(report) {
            error!("Dropping outcome of worker {}: {}", self.index, err);
        }
    }
}

impl Drop for OutcomeReporter {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            error!("Worker {} stopped before reporting an outcome", self.index);
            self.deliver(
                &tx,
                WorkerOutcome::Failure {
                    reason: FailureReason::Panicked,
                },
                0,
            );
        }
    }
}
