use std::time::Duration;

use reqwest::{Response, StatusCode, header::RETRY_AFTER};

/// How many extra attempts a call gets and how long to wait between them.
///
/// The wait before retry `n` (0-based) is `wait_min * 2^n`, capped at
/// `wait_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_max: u32,
    pub wait_min: Duration,
    pub wait_max: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.retry_max.saturating_add(1)
    }

    #[must_use]
    pub fn backoff(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(wait) = retry_after {
            return wait.min(self.wait_max);
        }
        2u32.checked_pow(retry)
            .and_then(|factor| self.wait_min.checked_mul(factor))
            .map_or(self.wait_max, |wait| wait.min(self.wait_max))
    }
}

/// An expected status is always terminal; otherwise 429 and 5xx (except 501)
/// are retried.
#[must_use]
pub fn is_retriable_status(status: u16, expected_status: u16) -> bool {
    if status == expected_status {
        return false;
    }
    status == StatusCode::TOO_MANY_REQUESTS.as_u16()
        || ((500..=599).contains(&status) && status != StatusCode::NOT_IMPLEMENTED.as_u16())
}

/// Requests that could not be built or hit the redirect limit will fail the
/// same way again.
#[must_use]
pub(super) fn is_retriable_error(err: &reqwest::Error) -> bool {
    !(err.is_builder() || err.is_redirect())
}

/// Server-provided wait in whole seconds, honored for 429 and 503 only.
pub(super) fn retry_after(response: &Response) -> Option<Duration> {
    let status = response.status();
    if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
        return None;
    }
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
