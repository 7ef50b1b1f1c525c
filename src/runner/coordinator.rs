use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info};

use crate::config::RunConfig;
use crate::http::RetryingClient;
use crate::telemetry::{Attribute, Telemetry};

use super::reporter::OutcomeReporter;
use super::tally::{Aggregator, RunReport};
use super::worker::{WorkerContext, run_worker};

/// Launches one worker per configured slot, waits for every outcome, and
/// returns the aggregated report.
///
/// Workers never share counters; each sends its single outcome over a channel
/// sized to the worker count and this function is the only reader.
pub async fn run(
    config: &Arc<RunConfig>,
    client: &Arc<RetryingClient>,
    telemetry: &Arc<dyn Telemetry>,
) -> RunReport {
    let workers = config.concurrency.get();
    let started = Instant::now();
    let deadline = config
        .deadline
        .and_then(|limit| started.checked_add(limit));

    let mut root = telemetry.start_span(
        "main",
        &[
            Attribute::new("http.url", &config.target_url),
            Attribute::new("deathstar.concurrency", workers),
        ],
    );

    let (tx, mut rx) = mpsc::channel(workers);
    let mut handles = Vec::with_capacity(workers);
    for index in 0..workers {
        info!("Making request routine {}", index);
        let span = root.child(
            &format!("makeRequest-{}", index),
            &[Attribute::new("request.idx", index)],
        );
        let ctx = WorkerContext {
            index,
            config: Arc::clone(config),
            client: Arc::clone(client),
            telemetry: Arc::clone(telemetry),
            deadline,
        };
        let reporter = OutcomeReporter::new(index, tx.clone());
        handles.push(tokio::spawn(run_worker(ctx, span, reporter)));
    }
    drop(tx);

    let mut aggregator = Aggregator::new(workers);
    while let Some(report) = rx.recv().await {
        aggregator.record(&report);
    }
    for handle in handles {
        if let Err(err) = handle.await {
            error!("Worker task ended abnormally: {}", err);
        }
    }

    let report = aggregator.finish(started.elapsed());
    root.record_event(
        "run-completed",
        &[
            Attribute::new("deathstar.successes", report.tally.successes),
            Attribute::new("deathstar.failures", report.tally.failures),
        ],
    );
    root.end();
    report
}
