use opentelemetry::metrics::{Counter, MeterProvider as _};
use opentelemetry::trace::{Status, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use opentelemetry_sdk::{Resource, runtime};

use crate::error::TelemetryError;

use super::{Attribute, OutcomeCounter, SERVICE_NAME, Telemetry, TelemetrySpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum OtlpProtocol {
    Http,
    Grpc,
}

/// OpenTelemetry SDK tracer and meter providers exporting over OTLP.
///
/// Both providers use batch/periodic export on the tokio runtime, so this
/// must be constructed from inside the runtime.
pub(super) struct OtlpTelemetry {
    tracer_provider: TracerProvider,
    meter_provider: SdkMeterProvider,
    tracer: Tracer,
    successes: Counter<u64>,
    failures: Counter<u64>,
}

struct OtlpSpan {
    tracer: Tracer,
    cx: Context,
}

fn key_values(attributes: &[Attribute]) -> Vec<KeyValue> {
    attributes
        .iter()
        .map(|attribute| KeyValue::new(attribute.key, attribute.value.clone()))
        .collect()
}

fn exporter_error(context: &'static str, err: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Exporter {
        context,
        message: err.to_string(),
    }
}

impl OtlpTelemetry {
    pub(super) fn new(
        protocol: OtlpProtocol,
        endpoint: Option<&str>,
        resource: &[Attribute],
    ) -> Result<Self, TelemetryError> {
        let resource = Resource::new(key_values(resource));

        let span_exporter = match (protocol, endpoint) {
            (OtlpProtocol::Http, Some(endpoint)) => SpanExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .build(),
            (OtlpProtocol::Http, None) => SpanExporter::builder().with_http().build(),
            (OtlpProtocol::Grpc, Some(endpoint)) => SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build(),
            (OtlpProtocol::Grpc, None) => SpanExporter::builder().with_tonic().build(),
        }
        .map_err(|err| exporter_error("Failed to build OTLP span exporter", err))?;

        let metric_exporter = match (protocol, endpoint) {
            (OtlpProtocol::Http, Some(endpoint)) => MetricExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .build(),
            (OtlpProtocol::Http, None) => MetricExporter::builder().with_http().build(),
            (OtlpProtocol::Grpc, Some(endpoint)) => MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build(),
            (OtlpProtocol::Grpc, None) => MetricExporter::builder().with_tonic().build(),
        }
        .map_err(|err| exporter_error("Failed to build OTLP metric exporter", err))?;

        let tracer_provider = TracerProvider::builder()
            .with_batch_exporter(span_exporter, runtime::Tokio)
            .with_resource(resource.clone())
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(metric_exporter, runtime::Tokio).build())
            .with_resource(resource)
            .build();

        let tracer = tracer_provider.tracer(SERVICE_NAME);
        let meter = meter_provider.meter(SERVICE_NAME);
        let successes = meter
            .u64_counter(OutcomeCounter::Success.name())
            .build();
        let failures = meter
            .u64_counter(OutcomeCounter::Failure.name())
            .build();

        Ok(Self {
            tracer_provider,
            meter_provider,
            tracer,
            successes,
            failures,
        })
    }
}

impl Telemetry for OtlpTelemetry {
    fn start_span(&self, name: &str, attributes: &[Attribute]) -> Box<dyn TelemetrySpan> {
        let span = self
            .tracer
            .span_builder(name.to_owned())
            .with_attributes(key_values(attributes))
            .start_with_context(&self.tracer, &Context::new());
        Box::new(OtlpSpan {
            tracer: self.tracer.clone(),
            cx: Context::new().with_span(span),
        })
    }

    fn increment_counter(&self, counter: OutcomeCounter) {
        match counter {
            OutcomeCounter::Success => self.successes.add(1, &[]),
            OutcomeCounter::Failure => self.failures.add(1, &[]),
        }
    }

    fn shutdown(&self) -> Result<(), TelemetryError> {
        let traces = self
            .tracer_provider
            .shutdown()
            .map_err(|err| exporter_error("Failed to shut down OTLP tracer provider", err));
        let metrics = self
            .meter_provider
            .shutdown()
            .map_err(|err| exporter_error("Failed to shut down OTLP meter provider", err));
        traces.and(metrics)
    }
}

impl TelemetrySpan for OtlpSpan {
    fn child(&self, name: &str, attributes: &[Attribute]) -> Box<dyn TelemetrySpan> {
        let span = self
            .tracer
            .span_builder(name.to_owned())
            .with_attributes(key_values(attributes))
            .start_with_context(&self.tracer, &self.cx);
        Box::new(OtlpSpan {
            tracer: self.tracer.clone(),
            cx: self.cx.with_span(span),
        })
    }

    fn record_event(&mut self, name: &str, attributes: &[Attribute]) {
        self.cx
            .span()
            .add_event(name.to_owned(), key_values(attributes));
    }

    fn record_error(&mut self, error: &dyn std::error::Error) {
        let span = self.cx.span();
        span.record_error(error);
        span.set_status(Status::error(error.to_string()));
    }

    fn end(self: Box<Self>) {
        self.cx.span().end();
    }
}
