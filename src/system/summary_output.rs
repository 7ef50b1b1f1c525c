use std::time::Duration;

use crate::config::RunConfig;
use crate::runner::RunReport;

/// Echo of the effective settings, logged before the workers start.
pub(crate) fn selection_lines(config: &RunConfig) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push("Selections:".to_owned());
    lines.push(format!("url: {}", config.target_url));
    lines.push(format!("method: {}", config.method));
    lines.push(format!("body_bytes: {}", config.body.len()));
    lines.push(format!(
        "content_type: {}",
        config.content_type.as_deref().unwrap_or("none")
    ));
    lines.push(format!("concurrency: {}", config.concurrency));
    lines.push(format!("retry_max: {}", config.retry.retry_max));
    lines.push(format!(
        "retry_wait_ms: {}..{}",
        config.retry.wait_min.as_millis(),
        config.retry.wait_max.as_millis()
    ));
    lines.push(format!("expected_status: {}", config.expected_status));
    lines.push(format!(
        "request_timeout_ms: {}",
        config.request_timeout.as_millis()
    ));
    lines.push(format!(
        "deadline_ms: {}",
        config
            .deadline
            .map_or_else(|| "none".to_owned(), |deadline| deadline.as_millis().to_string())
    ));
    lines
}

/// Final tally lines. The first two are the run's primary output.
pub(crate) fn summary_lines(report: &RunReport) -> Vec<String> {
    let mut lines = vec![
        format!("Successful calls: {}", report.tally.successes),
        format!("Failed calls: {}", report.tally.failures),
    ];
    for (kind, count) in &report.failures_by_kind {
        lines.push(format!("  {}: {}", kind.as_str(), count));
    }
    lines.push(format!("Attempts: {}", report.total_attempts));
    lines.push(format!(
        "Latency min/avg/max: {} / {} / {}",
        format_millis(report.min_latency),
        format_millis(report.avg_latency),
        format_millis(report.max_latency)
    ));
    lines.push(format!("Wall time: {}", format_millis(report.wall_time)));
    lines
}

pub(crate) fn print_summary(report: &RunReport) {
    for line in summary_lines(report) {
        println!("{}", line);
    }
}

fn format_millis(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}
