use crate::error::TelemetryError;

use super::{Attribute, OutcomeCounter, Telemetry, TelemetrySpan};

pub struct NoopTelemetry;

struct NoopSpan;

impl Telemetry for NoopTelemetry {
    fn start_span(&self, _name: &str, _attributes: &[Attribute]) -> Box<dyn TelemetrySpan> {
        Box::new(NoopSpan)
    }

    fn increment_counter(&self, _counter: OutcomeCounter) {}

    fn shutdown(&self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

impl TelemetrySpan for NoopSpan {
    fn child(&self, _name: &str, _attributes: &[Attribute]) -> Box<dyn TelemetrySpan> {
        Box::new(NoopSpan)
    }

    fn record_event(&mut self, _name: &str, _attributes: &[Attribute]) {}

    fn record_error(&mut self, _error: &dyn std::error::Error) {}

    fn end(self: Box<Self>) {}
}
