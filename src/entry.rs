use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use crate::args::RunArgs;
use crate::config::{RunConfig, TelemetryConfig};
use crate::error::{AppError, AppResult};
use crate::http::RetryingClient;
use crate::system::logger::init_logging;
use crate::system::{print_summary, selection_lines};
use crate::telemetry::{self, NoopTelemetry, Telemetry};

/// Parses the command line, runs the workers once, and prints the tally.
///
/// Failed calls do not make the process fail; only configuration and setup
/// errors do.
///
/// # Errors
///
/// Returns an error when the configuration is invalid, the runtime cannot be
/// started, or the HTTP client cannot be built.
pub fn run() -> AppResult<()> {
    let args = RunArgs::parse();
    init_logging(args.verbose, args.no_color);

    let config = RunConfig::resolve(&args).map_err(|err| {
        error!("Invalid configuration: {}", err);
        AppError::config(err)
    })?;
    let telemetry_config = TelemetryConfig::resolve(&args).map_err(|err| {
        error!("Invalid telemetry configuration: {}", err);
        AppError::config(err)
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_async(config, &telemetry_config))
}

async fn run_async(config: RunConfig, telemetry_config: &TelemetryConfig) -> AppResult<()> {
    for line in selection_lines(&config) {
        info!("{}", line);
    }

    let client = Arc::new(RetryingClient::from_config(&config)?);
    let telemetry = init_telemetry(telemetry_config);
    let config = Arc::new(config);

    let report = crate::runner::run(&config, &client, &telemetry).await;
    info!("All requests completed");
    print_summary(&report);

    shutdown_telemetry(telemetry).await
}

fn init_telemetry(config: &TelemetryConfig) -> Arc<dyn Telemetry> {
    match telemetry::init(config) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            warn!(
                "Telemetry exporter '{}' unavailable, continuing without it: {}",
                config.exporter.as_str(),
                err
            );
            Arc::new(NoopTelemetry)
        }
    }
}

/// Exporters may block while flushing, so shutdown runs off the async workers.
async fn shutdown_telemetry(telemetry: Arc<dyn Telemetry>) -> AppResult<()> {
    let result = tokio::task::spawn_blocking(move || telemetry.shutdown()).await?;
    if let Err(err) = result {
        warn!("Telemetry shutdown failed: {}", err);
    }
    Ok(())
}
