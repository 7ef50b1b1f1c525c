use std::time::Duration;

use thiserror::Error;

use crate::error::{AttemptError, HttpError};
use crate::http::Response;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    Success { status: u16 },
    Failure { reason: FailureReason },
}

impl WorkerOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, WorkerOutcome::Success { .. })
    }
}

/// Why a worker's call counted as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("transport error: {message}")]
    Transport { message: String, timed_out: bool },
    #[error("unexpected status {status} (expected {expected})")]
    UnexpectedStatus { status: u16, expected: u16 },
    #[error("giving up after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: AttemptError },
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
    #[error("run deadline exceeded")]
    DeadlineExceeded,
    #[error("worker stopped before reporting an outcome")]
    Panicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    Transport,
    UnexpectedStatus,
    RetriesExhausted,
    InvalidRequest,
    DeadlineExceeded,
    Panicked,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::UnexpectedStatus => "unexpected-status",
            FailureKind::RetriesExhausted => "retries-exhausted",
            FailureKind::InvalidRequest => "invalid-request",
            FailureKind::DeadlineExceeded => "deadline-exceeded",
            FailureKind::Panicked => "panicked",
        }
    }
}

impl FailureReason {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            FailureReason::Transport { .. } => FailureKind::Transport,
            FailureReason::UnexpectedStatus { .. } => FailureKind::UnexpectedStatus,
            FailureReason::RetriesExhausted { .. } => FailureKind::RetriesExhausted,
            FailureReason::InvalidRequest { .. } => FailureKind::InvalidRequest,
            FailureReason::DeadlineExceeded => FailureKind::DeadlineExceeded,
            FailureReason::Panicked => FailureKind::Panicked,
        }
    }
}

impl From<HttpError> for FailureReason {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Transport { source, .. } => FailureReason::Transport {
                message: source.to_string(),
                timed_out: source.is_timeout(),
            },
            HttpError::RetriesExhausted { attempts, last } => {
                FailureReason::RetriesExhausted { attempts, last }
            }
            HttpError::BuildClientFailed { source } | HttpError::BuildRequestFailed { source } => {
                FailureReason::InvalidRequest {
                    message: source.to_string(),
                }
            }
        }
    }
}

/// Success iff the terminal status is the expected one. A transport error is
/// a failure without any response to inspect.
#[must_use]
pub fn classify(result: Result<Response, HttpError>, expected_status: u16) -> WorkerOutcome {
    match result {
        Ok(Response { status, .. }) if status == expected_status => {
            WorkerOutcome::Success { status }
        }
        Ok(Response { status, .. }) => WorkerOutcome::Failure {
            reason: FailureReason::UnexpectedStatus {
                status,
                expected: expected_status,
            },
        },
        Err(err) => WorkerOutcome::Failure { reason: err.into() },
    }
}

/// What one worker hands to the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub index: usize,
    pub outcome: WorkerOutcome,
    pub attempts: u32,
    pub elapsed: Duration,
}
