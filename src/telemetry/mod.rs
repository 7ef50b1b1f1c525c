//! Telemetry backends behind one injectable interface.
//!
//! The coordinator and workers only see [`Telemetry`] and [`TelemetrySpan`];
//! which exporter sits behind them is decided once at startup by [`init`].
//! Emission never fails a worker: span methods swallow their own errors and
//! only [`Telemetry::shutdown`] reports a failure, which callers log.
mod json;
mod noop;
#[cfg(feature = "otlp")]
mod otlp;

#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use serde::Serialize;

use crate::args::ExporterKind;
use crate::config::TelemetryConfig;
use crate::error::TelemetryError;

pub use json::JsonTelemetry;
pub use noop::NoopTelemetry;

pub const SERVICE_NAME: &str = "deathstar";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub key: &'static str,
    pub value: String,
}

impl Attribute {
    pub fn new(key: &'static str, value: impl ToString) -> Self {
        Self {
            key,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCounter {
    Success,
    Failure,
}

impl OutcomeCounter {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OutcomeCounter::Success => "deathstar.requests.success",
            OutcomeCounter::Failure => "deathstar.requests.failure",
        }
    }
}

pub trait Telemetry: Send + Sync {
    fn start_span(&self, name: &str, attributes: &[Attribute]) -> Box<dyn TelemetrySpan>;

    fn increment_counter(&self, counter: OutcomeCounter);

    /// Flushes and stops the backend. Called once, after the run.
    ///
    /// # Errors
    ///
    /// Returns an error when buffered records could not be delivered.
    fn shutdown(&self) -> Result<(), TelemetryError>;
}

pub trait TelemetrySpan: Send {
    fn child(&self, name: &str, attributes: &[Attribute]) -> Box<dyn TelemetrySpan>;

    fn record_event(&mut self, name: &str, attributes: &[Attribute]);

    fn record_error(&mut self, error: &dyn std::error::Error);

    fn end(self: Box<Self>);
}

/// Attributes describing this process, attached to every exported record.
#[must_use]
pub fn resource_attributes(environment: &str) -> Vec<Attribute> {
    vec![
        Attribute::new("service.name", SERVICE_NAME),
        Attribute::new("service.version", SERVICE_VERSION),
        Attribute::new("environment", environment),
    ]
}

/// Builds the backend selected by the configuration.
///
/// # Errors
///
/// Returns an error when the traces file cannot be created or an OTLP
/// exporter cannot be set up.
pub fn init(config: &TelemetryConfig) -> Result<Arc<dyn Telemetry>, TelemetryError> {
    let resource = resource_attributes(&config.environment);
    match config.exporter {
        ExporterKind::None => Ok(Arc::new(NoopTelemetry)),
        ExporterKind::Console => Ok(Arc::new(JsonTelemetry::new(
            Box::new(std::io::stdout()),
            resource,
        ))),
        ExporterKind::File => {
            let file = File::create(&config.traces_file).map_err(|err| {
                TelemetryError::CreateTracesFile {
                    path: config.traces_file.clone(),
                    source: err,
                }
            })?;
            Ok(Arc::new(JsonTelemetry::new(
                Box::new(BufWriter::new(file)),
                resource,
            )))
        }
        ExporterKind::OtlpHttp | ExporterKind::OtlpGrpc => init_otlp(config, &resource),
    }
}

#[cfg(feature = "otlp")]
fn init_otlp(
    config: &TelemetryConfig,
    resource: &[Attribute],
) -> Result<Arc<dyn Telemetry>, TelemetryError> {
    let protocol = if config.exporter == ExporterKind::OtlpGrpc {
        otlp::OtlpProtocol::Grpc
    } else {
        otlp::OtlpProtocol::Http
    };
    Ok(Arc::new(otlp::OtlpTelemetry::new(
        protocol,
        config.otlp_endpoint.as_deref(),
        resource,
    )?))
}

#[cfg(not(feature = "otlp"))]
fn init_otlp(
    config: &TelemetryConfig,
    _resource: &[Attribute],
) -> Result<Arc<dyn Telemetry>, TelemetryError> {
    Err(TelemetryError::Exporter {
        context: "OTLP exporter",
        message: format!(
            "'{}' requires building with the 'otlp' feature",
            config.exporter.as_str()
        ),
    })
}
