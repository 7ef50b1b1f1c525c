use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TARGET_URL not set, exiting.")]
    MissingTargetUrl,
    #[error("Invalid TARGET_URL '{url}': {source}")]
    InvalidTargetUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported scheme '{scheme}' in TARGET_URL '{url}'. Use http or https.")]
    UnsupportedScheme { url: String, scheme: String },
    #[error("Invalid HTTP_METHOD '{value}'. Use GET, POST, PUT, DELETE, or PATCH.")]
    InvalidMethod { value: String },
    #[error("MAX_ROUTINES must be >= 1.")]
    ZeroConcurrency,
    #[error("MAX_ROUTINES {value} exceeds the limit of {limit}.")]
    ConcurrencyTooLarge { value: usize, limit: usize },
    #[error("Invalid expected status code {status}. Use a value between 100 and 999.")]
    InvalidExpectedStatus { status: u16 },
    #[error("Retry wait minimum ({min:?}) must not exceed the maximum ({max:?}).")]
    RetryWaitRange { min: Duration, max: Duration },
    #[error("Exporter '{exporter}' requires building with the 'otlp' feature.")]
    ExporterUnavailable { exporter: &'static str },
    #[error("Traces file path must not be empty.")]
    EmptyTracesFile,
}
