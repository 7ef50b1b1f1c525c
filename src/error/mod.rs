mod app;
mod config;
mod http;
mod telemetry;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::{AttemptError, HttpError};
pub use telemetry::TelemetryError;
pub use validation::ValidationError;
