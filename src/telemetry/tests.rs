use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tempfile::tempdir;

use super::*;
use crate::args::ExporterKind;
use crate::config::TelemetryConfig;
use crate::error::ConfigError;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_poisoned| std::io::Error::other("buffer lock poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn records(&self) -> Result<Vec<Value>, String> {
        let inner = self
            .0
            .lock()
            .map_err(|_poisoned| "buffer lock poisoned".to_owned())?;
        let text = String::from_utf8(inner.clone()).map_err(|err| err.to_string())?;
        text.lines()
            .map(|line| serde_json::from_str(line).map_err(|err| err.to_string()))
            .collect()
    }
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("disk full"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Err(std::io::Error::other("disk full"))
    }
}

fn find<'records>(records: &'records [Value], name: &str) -> Result<&'records Value, String> {
    records
        .iter()
        .find(|record| record["name"] == name)
        .ok_or_else(|| format!("No record named {}", name))
}

#[test]
fn spans_are_written_with_parent_links() -> Result<(), String> {
    let buffer = SharedBuffer::default();
    let telemetry = JsonTelemetry::new(Box::new(buffer.clone()), resource_attributes("test"));

    let root = telemetry.start_span("main", &[]);
    let mut child = root.child("makeRequest-0", &[Attribute::new("request.idx", 0)]);
    child.record_event("making-request", &[]);
    child.end();
    root.end();

    let records = buffer.records()?;
    if records.len() != 2 {
        return Err(format!("Expected 2 spans, got {}", records.len()));
    }
    let main = find(&records, "main")?;
    let worker = find(&records, "makeRequest-0")?;
    if worker["parent_span_id"] != main["span_id"] {
        return Err(format!("Child not linked to parent: {}", worker));
    }
    if !main["parent_span_id"].is_null() {
        return Err("Root span must not have a parent".to_owned());
    }
    if worker["trace_id"] != main["trace_id"] {
        return Err("Spans of one run must share a trace id".to_owned());
    }
    if worker["attributes"][0]["key"] != "request.idx" || worker["attributes"][0]["value"] != "0"
    {
        return Err(format!("Unexpected attributes: {}", worker["attributes"]));
    }
    if worker["events"][0]["name"] != "making-request" {
        return Err(format!("Unexpected events: {}", worker["events"]));
    }
    if main["resource"][0]["value"] != "deathstar" {
        return Err(format!("Unexpected resource: {}", main["resource"]));
    }
    Ok(())
}

#[test]
fn recorded_errors_mark_the_span() -> Result<(), String> {
    let buffer = SharedBuffer::default();
    let telemetry = JsonTelemetry::new(Box::new(buffer.clone()), Vec::new());

    let mut span = telemetry.start_span("makeRequest-3", &[]);
    span.record_error(&ConfigError::ZeroConcurrency);
    span.end();

    let records = buffer.records()?;
    let span = find(&records, "makeRequest-3")?;
    if span["status"] != "error" {
        return Err(format!("Expected error status: {}", span));
    }
    if span["events"][0]["name"] != "exception" {
        return Err(format!("Expected exception event: {}", span));
    }
    Ok(())
}

#[test]
fn counters_are_flushed_on_shutdown() -> Result<(), String> {
    let buffer = SharedBuffer::default();
    let telemetry = JsonTelemetry::new(Box::new(buffer.clone()), Vec::new());

    telemetry.increment_counter(OutcomeCounter::Success);
    telemetry.increment_counter(OutcomeCounter::Success);
    telemetry.increment_counter(OutcomeCounter::Failure);
    if !buffer.records()?.is_empty() {
        return Err("Counters must not be written before shutdown".to_owned());
    }
    telemetry.shutdown().map_err(|err| err.to_string())?;

    let records = buffer.records()?;
    let success = find(&records, "deathstar.requests.success")?;
    let failure = find(&records, "deathstar.requests.failure")?;
    if success["value"] != 2 || failure["value"] != 1 {
        return Err(format!("Unexpected counters: {} / {}", success, failure));
    }
    Ok(())
}

#[test]
fn write_failures_are_swallowed_by_spans() -> Result<(), String> {
    let telemetry = JsonTelemetry::new(Box::new(FailingWriter), Vec::new());

    let mut span = telemetry.start_span("main", &[]);
    span.record_event("making-request", &[]);
    span.end();
    telemetry.increment_counter(OutcomeCounter::Failure);

    if telemetry.shutdown().is_ok() {
        return Err("Expected shutdown to report the write failure".to_owned());
    }
    Ok(())
}

#[test]
fn noop_backend_accepts_everything() -> Result<(), String> {
    let telemetry = NoopTelemetry;
    let root = telemetry.start_span("main", &[]);
    let mut child = root.child("makeRequest-0", &[]);
    child.record_error(&ConfigError::MissingTargetUrl);
    child.end();
    root.end();
    telemetry.increment_counter(OutcomeCounter::Success);
    telemetry.shutdown().map_err(|err| err.to_string())
}

#[test]
fn file_exporter_creates_traces_file() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("traces.txt");
    let config = TelemetryConfig {
        exporter: ExporterKind::File,
        traces_file: path.clone(),
        otlp_endpoint: None,
        environment: "demo".to_owned(),
    };

    let telemetry = init(&config).map_err(|err| err.to_string())?;
    telemetry.start_span("main", &[]).end();
    telemetry.shutdown().map_err(|err| err.to_string())?;

    let content =
        std::fs::read_to_string(&path).map_err(|err| format!("read traces failed: {}", err))?;
    if !content.contains("\"name\":\"main\"") {
        return Err(format!("Span missing from traces file: {}", content));
    }
    Ok(())
}

#[test]
fn file_exporter_reports_unwritable_path() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = TelemetryConfig {
        exporter: ExporterKind::File,
        traces_file: dir.path().join("missing").join("traces.txt"),
        otlp_endpoint: None,
        environment: "demo".to_owned(),
    };
    match init(&config) {
        Err(crate::error::TelemetryError::CreateTracesFile { .. }) => Ok(()),
        Err(other) => Err(format!("Unexpected error: {}", other)),
        Ok(_) => Err("Expected CreateTracesFile error".to_owned()),
    }
}

#[cfg(feature = "otlp")]
#[test]
fn otlp_http_exporter_shuts_down_with_unreachable_collector() -> Result<(), String> {
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::test_support::{refused_url, run_async_test};

    run_async_test(async {
        let config = TelemetryConfig {
            exporter: ExporterKind::OtlpHttp,
            traces_file: PathBuf::from("unused.txt"),
            otlp_endpoint: Some(refused_url()?),
            environment: "test".to_owned(),
        };
        let telemetry = init(&config).map_err(|err| err.to_string())?;

        let root = telemetry.start_span("main", &[]);
        let mut child = root.child("makeRequest-0", &[Attribute::new("request.idx", 0)]);
        child.record_event("making-request", &[]);
        child.record_error(&ConfigError::ZeroConcurrency);
        child.end();
        root.end();
        telemetry.increment_counter(OutcomeCounter::Success);

        // Delivery to a closed port fails; only completion matters here.
        let shutdown = tokio::task::spawn_blocking(move || telemetry.shutdown());
        let joined = tokio::time::timeout(Duration::from_secs(20), shutdown)
            .await
            .map_err(|_elapsed| "OTLP shutdown did not finish within 20s".to_owned())?;
        joined.map_err(|err| format!("shutdown task failed: {}", err))?;
        Ok(())
    })
}
