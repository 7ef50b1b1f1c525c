//! Resolution of parsed arguments into the immutable run configuration.
mod resolve;
mod types;


pub use types::{RunConfig, TelemetryConfig};
