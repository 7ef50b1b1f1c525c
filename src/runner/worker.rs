use std::sync::Arc;

use tokio::time::{Instant, timeout_at};
use tracing::{error, info, warn};
use url::Url;

use crate::config::RunConfig;
use crate::http::{AttemptHooks, RetryingClient};
use crate::telemetry::{Attribute, OutcomeCounter, Telemetry, TelemetrySpan};

use super::outcome::{FailureReason, WorkerOutcome, classify};
use super::reporter::OutcomeReporter;

pub(crate) struct WorkerContext {
    pub(crate) index: usize,
    pub(crate) config: Arc<RunConfig>,
    pub(crate) client: Arc<RetryingClient>,
    pub(crate) telemetry: Arc<dyn Telemetry>,
    pub(crate) deadline: Option<Instant>,
}

/// Logs each attempt and mirrors it onto the worker's span.
struct WorkerHooks<'span> {
    index: usize,
    attempts: u32,
    span: &'span mut dyn TelemetrySpan,
}

impl AttemptHooks for WorkerHooks<'_> {
    fn on_request(&mut self, url: &Url, attempt: u32) {
        self.attempts = attempt.saturating_add(1);
        info!("Making request to URL: {}, retry count: {}", url, attempt);
        self.span.record_event(
            "attempt",
            &[
                Attribute::new("http.url", url),
                Attribute::new("attempt.number", attempt),
            ],
        );
    }

    fn on_response(&mut self, url: &Url, status: u16, attempt: u32) {
        info!("URL: {}; Status: {}", url, status);
        self.span.record_event(
            "response",
            &[
                Attribute::new("http.status_code", status),
                Attribute::new("attempt.number", attempt),
            ],
        );
    }

    fn on_transport_error(&mut self, url: &Url, err: &reqwest::Error, attempt: u32) {
        warn!(
            "Request {} to {} failed on attempt {}: {}",
            self.index, url, attempt, err
        );
        self.span.record_event(
            "transport-error",
            &[
                Attribute::new("error.message", err),
                Attribute::new("attempt.number", attempt),
            ],
        );
    }
}

/// Issues one retried call and reports its outcome exactly once.
pub(crate) async fn run_worker(
    ctx: WorkerContext,
    mut span: Box<dyn TelemetrySpan>,
    reporter: OutcomeReporter,
) {
    let url = ctx.client.url().clone();
    span.record_event("making-request", &[Attribute::new("http.url", &url)]);

    let (result, attempts) = {
        let mut hooks = WorkerHooks {
            index: ctx.index,
            attempts: 0,
            span: span.as_mut(),
        };
        let result = match ctx.deadline {
            Some(deadline) => timeout_at(deadline, ctx.client.send(&mut hooks)).await.ok(),
            None => Some(ctx.client.send(&mut hooks).await),
        };
        (result, hooks.attempts)
    };

    let outcome = match result {
        Some(result) => classify(result, ctx.config.expected_status),
        None => WorkerOutcome::Failure {
            reason: FailureReason::DeadlineExceeded,
        },
    };

    match &outcome {
        WorkerOutcome::Success { status } => {
            info!("Request {} succeeded with status {}", ctx.index, status);
            span.record_event(
                "request-succeeded",
                &[
                    Attribute::new("http.url", &url),
                    Attribute::new("http.status_code", status),
                ],
            );
            ctx.telemetry.increment_counter(OutcomeCounter::Success);
        }
        WorkerOutcome::Failure { reason } => {
            error!("Request {} failed: {}", ctx.index, reason);
            span.record_event(
                "request-failed",
                &[
                    Attribute::new("http.url", &url),
                    Attribute::new("failure.kind", reason.kind().as_str()),
                ],
            );
            span.record_error(reason);
            ctx.telemetry.increment_counter(OutcomeCounter::Failure);
        }
    }
    span.end();
    reporter.report(outcome, attempts);
}
