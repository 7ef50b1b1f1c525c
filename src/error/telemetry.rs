use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to create traces file '{path}': {source}")]
    CreateTracesFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize telemetry record: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write telemetry record: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
    #[error("Telemetry writer lock was poisoned.")]
    LockPoisoned,
    #[error("{context}: {message}")]
    Exporter {
        context: &'static str,
        message: String,
    },
}
