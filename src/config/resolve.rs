use std::num::NonZeroUsize;

use url::Url;

use crate::args::{ExporterKind, HttpMethod, MAX_CONCURRENCY, RunArgs};
use crate::error::ConfigError;
use crate::http::RetryPolicy;

use super::types::{RunConfig, TelemetryConfig};

impl RunConfig {
    /// Validates parsed arguments into the configuration for a run.
    ///
    /// # Errors
    ///
    /// Returns an error when the target URL is missing or invalid, the method
    /// is not one of GET/POST/PUT/DELETE/PATCH, the concurrency is zero or
    /// above the worker limit, the expected status is out of range, or the
    /// retry waits are inverted.
    pub fn resolve(args: &RunArgs) -> Result<Self, ConfigError> {
        let target_url = resolve_target_url(args.url.as_deref())?;
        let method: HttpMethod = args.method.parse()?;
        let concurrency =
            NonZeroUsize::new(args.concurrency).ok_or(ConfigError::ZeroConcurrency)?;
        if concurrency.get() > MAX_CONCURRENCY {
            return Err(ConfigError::ConcurrencyTooLarge {
                value: concurrency.get(),
                limit: MAX_CONCURRENCY,
            });
        }

        if !(100..=999).contains(&args.expected_status) {
            return Err(ConfigError::InvalidExpectedStatus {
                status: args.expected_status,
            });
        }
        if args.retry_wait_min > args.retry_wait_max {
            return Err(ConfigError::RetryWaitRange {
                min: args.retry_wait_min,
                max: args.retry_wait_max,
            });
        }

        let content_type = Some(args.content_type.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        Ok(Self {
            target_url,
            method,
            body: args.body.as_bytes().to_vec(),
            content_type,
            concurrency,
            retry: RetryPolicy {
                retry_max: args.retry_max,
                wait_min: args.retry_wait_min,
                wait_max: args.retry_wait_max,
            },
            expected_status: args.expected_status,
            request_timeout: args.request_timeout,
            deadline: args.deadline,
        })
    }
}

impl TelemetryConfig {
    /// Validates the exporter selection.
    ///
    /// # Errors
    ///
    /// Returns an error when an OTLP exporter is selected without the `otlp`
    /// feature, or when the file exporter has an empty path.
    pub fn resolve(args: &RunArgs) -> Result<Self, ConfigError> {
        if args.exporter.is_otlp() && !cfg!(feature = "otlp") {
            return Err(ConfigError::ExporterUnavailable {
                exporter: args.exporter.as_str(),
            });
        }
        if args.exporter == ExporterKind::File && args.traces_file.as_os_str().is_empty() {
            return Err(ConfigError::EmptyTracesFile);
        }

        let otlp_endpoint = args
            .otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        Ok(Self {
            exporter: args.exporter,
            traces_file: args.traces_file.clone(),
            otlp_endpoint,
            environment: args.environment.clone(),
        })
    }
}

fn resolve_target_url(value: Option<&str>) -> Result<Url, ConfigError> {
    let raw = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingTargetUrl)?;
    let url = Url::parse(raw).map_err(|err| ConfigError::InvalidTargetUrl {
        url: raw.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme {
            url: raw.to_owned(),
            scheme: other.to_owned(),
        }),
    }
}
