use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::TelemetryError;

use super::{Attribute, OutcomeCounter, Telemetry, TelemetrySpan};

/// Writes finished spans, and the counters at shutdown, as JSON lines.
///
/// Backs both the `console` (stdout) and `file` exporters.
pub struct JsonTelemetry {
    shared: Arc<Shared>,
}

struct Shared {
    writer: Mutex<Box<dyn Write + Send>>,
    trace_id: String,
    next_span_id: AtomicU64,
    resource: Vec<Attribute>,
    successes: AtomicU64,
    failures: AtomicU64,
}

struct JsonSpan {
    shared: Arc<Shared>,
    span_id: u64,
    parent_span_id: Option<u64>,
    name: String,
    start_time: DateTime<Utc>,
    started: Instant,
    attributes: Vec<Attribute>,
    events: Vec<EventRecord>,
    error: Option<String>,
}

#[derive(Serialize)]
struct EventRecord {
    name: String,
    offset_us: u64,
    attributes: Vec<Attribute>,
}

#[derive(Serialize)]
struct SpanRecord<'span> {
    #[serde(rename = "type")]
    kind: &'static str,
    trace_id: &'span str,
    span_id: u64,
    parent_span_id: Option<u64>,
    name: &'span str,
    start_time: String,
    duration_us: u64,
    status: &'static str,
    error: Option<&'span str>,
    attributes: &'span [Attribute],
    events: &'span [EventRecord],
    resource: &'span [Attribute],
}

#[derive(Serialize)]
struct CounterRecord<'counter> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'static str,
    value: u64,
    resource: &'counter [Attribute],
}

impl JsonTelemetry {
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>, resource: Vec<Attribute>) -> Self {
        let started = Utc::now();
        let trace_id = format!(
            "{:032x}",
            started.timestamp_nanos_opt().map_or(0, i64::unsigned_abs)
        );
        Self {
            shared: Arc::new(Shared {
                writer: Mutex::new(writer),
                trace_id,
                next_span_id: AtomicU64::new(1),
                resource,
                successes: AtomicU64::new(0),
                failures: AtomicU64::new(0),
            }),
        }
    }
}

impl Telemetry for JsonTelemetry {
    fn start_span(&self, name: &str, attributes: &[Attribute]) -> Box<dyn TelemetrySpan> {
        Box::new(JsonSpan::start(
            Arc::clone(&self.shared),
            None,
            name,
            attributes,
        ))
    }

    fn increment_counter(&self, counter: OutcomeCounter) {
        let slot = match counter {
            OutcomeCounter::Success => &self.shared.successes,
            OutcomeCounter::Failure => &self.shared.failures,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    fn shutdown(&self) -> Result<(), TelemetryError> {
        for counter in [OutcomeCounter::Success, OutcomeCounter::Failure] {
            let value = match counter {
                OutcomeCounter::Success => self.shared.successes.load(Ordering::Relaxed),
                OutcomeCounter::Failure => self.shared.failures.load(Ordering::Relaxed),
            };
            self.shared.write_record(&CounterRecord {
                kind: "counter",
                name: counter.name(),
                value,
                resource: &self.shared.resource,
            })?;
        }
        self.shared
            .writer
            .lock()
            .map_err(|_poisoned| TelemetryError::LockPoisoned)?
            .flush()
            .map_err(|err| TelemetryError::Write { source: err })
    }
}

impl Shared {
    fn write_record<T: Serialize>(&self, record: &T) -> Result<(), TelemetryError> {
        let mut line =
            serde_json::to_vec(record).map_err(|err| TelemetryError::Serialize { source: err })?;
        line.push(b'\n');
        let mut writer = self
            .writer
            .lock()
            .map_err(|_poisoned| TelemetryError::LockPoisoned)?;
        writer
            .write_all(&line)
            .map_err(|err| TelemetryError::Write { source: err })
    }
}

impl JsonSpan {
    fn start(
        shared: Arc<Shared>,
        parent_span_id: Option<u64>,
        name: &str,
        attributes: &[Attribute],
    ) -> Self {
        let span_id = shared.next_span_id.fetch_add(1, Ordering::Relaxed);
        Self {
            shared,
            span_id,
            parent_span_id,
            name: name.to_owned(),
            start_time: Utc::now(),
            started: Instant::now(),
            attributes: attributes.to_vec(),
            events: Vec::new(),
            error: None,
        }
    }

    fn offset_us(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}

impl TelemetrySpan for JsonSpan {
    fn child(&self, name: &str, attributes: &[Attribute]) -> Box<dyn TelemetrySpan> {
        Box::new(JsonSpan::start(
            Arc::clone(&self.shared),
            Some(self.span_id),
            name,
            attributes,
        ))
    }

    fn record_event(&mut self, name: &str, attributes: &[Attribute]) {
        let offset_us = self.offset_us();
        self.events.push(EventRecord {
            name: name.to_owned(),
            offset_us,
            attributes: attributes.to_vec(),
        });
    }

    fn record_error(&mut self, error: &dyn std::error::Error) {
        let message = error.to_string();
        self.record_event(
            "exception",
            &[Attribute::new("exception.message", &message)],
        );
        self.error = Some(message);
    }

    fn end(self: Box<Self>) {
        let record = SpanRecord {
            kind: "span",
            trace_id: &self.shared.trace_id,
            span_id: self.span_id,
            parent_span_id: self.parent_span_id,
            name: &self.name,
            start_time: self.start_time.to_rfc3339(),
            duration_us: self.offset_us(),
            status: if self.error.is_some() { "error" } else { "ok" },
            error: self.error.as_deref(),
            attributes: &self.attributes,
            events: &self.events,
            resource: &self.shared.resource,
        };
        if let Err(err) = self.shared.write_record(&record) {
            warn!("Dropping span '{}': {}", self.name, err);
        }
    }
}
