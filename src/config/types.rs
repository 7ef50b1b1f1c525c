use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::args::{ExporterKind, HttpMethod};
use crate::http::RetryPolicy;

/// Immutable settings for one run, shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub target_url: Url,
    pub method: HttpMethod,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub concurrency: NonZeroUsize,
    pub retry: RetryPolicy,
    pub expected_status: u16,
    pub request_timeout: Duration,
    pub deadline: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub exporter: ExporterKind,
    pub traces_file: PathBuf,
    pub otlp_endpoint: Option<String>,
    pub environment: String,
}
