use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, builder::FalseyValueParser};

use super::defaults::{
    DEFAULT_CONCURRENCY, DEFAULT_CONTENT_TYPE, DEFAULT_ENVIRONMENT, DEFAULT_EXPECTED_STATUS,
    DEFAULT_METHOD, DEFAULT_RETRY_MAX, DEFAULT_TRACES_FILE,
};
use super::parsers::parse_duration_arg;
use super::types::ExporterKind;

/// Every option can be given as a flag or through its environment variable;
/// flags win.
#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent HTTP load checker - fans out a fixed number of workers, each sending one retried request, and reports how many calls succeeded."
)]
pub struct RunArgs {
    /// Target URL every worker calls
    #[arg(long = "url", short = 'u', env = "TARGET_URL")]
    pub url: Option<String>,

    /// HTTP method to use (GET, POST, PUT, DELETE, PATCH)
    #[arg(long, short = 'X', env = "HTTP_METHOD", default_value = DEFAULT_METHOD)]
    pub method: String,

    /// Request body sent by every worker
    #[arg(long = "body", short = 'd', env = "REQUEST_BODY", default_value = "")]
    pub body: String,

    /// Content-Type header sent with every request (empty to omit)
    #[arg(
        long = "content-type",
        short = 'T',
        env = "CONTENT_TYPE",
        default_value = DEFAULT_CONTENT_TYPE
    )]
    pub content_type: String,

    /// Number of concurrent workers, one request each
    #[arg(
        long = "concurrency",
        short = 'c',
        env = "MAX_ROUTINES",
        default_value_t = DEFAULT_CONCURRENCY
    )]
    pub concurrency: usize,

    /// Additional attempts after a failed one
    #[arg(
        long = "retry-max",
        short = 'r',
        env = "HTTP_RETRY_MAX",
        default_value_t = DEFAULT_RETRY_MAX
    )]
    pub retry_max: u32,

    /// Minimum wait between attempts (supports ms/s/m/h)
    #[arg(
        long = "retry-wait-min",
        env = "HTTP_RETRY_WAIT_MIN",
        default_value = "1s",
        value_parser = parse_duration_arg
    )]
    pub retry_wait_min: Duration,

    /// Maximum wait between attempts (supports ms/s/m/h)
    #[arg(
        long = "retry-wait-max",
        env = "HTTP_RETRY_WAIT_MAX",
        default_value = "30s",
        value_parser = parse_duration_arg
    )]
    pub retry_wait_max: Duration,

    /// Expected HTTP status code
    #[arg(
        long = "status",
        short = 's',
        env = "EXPECTED_STATUS",
        default_value_t = DEFAULT_EXPECTED_STATUS
    )]
    pub expected_status: u16,

    /// Per-attempt request timeout (supports ms/s/m/h)
    #[arg(
        long = "timeout",
        env = "HTTP_TIMEOUT",
        default_value = "10s",
        value_parser = parse_duration_arg
    )]
    pub request_timeout: Duration,

    /// Overall run deadline; unfinished workers fail when it elapses
    #[arg(long = "deadline", env = "RUN_DEADLINE", value_parser = parse_duration_arg)]
    pub deadline: Option<Duration>,

    /// Telemetry exporter
    #[arg(
        long = "exporter",
        env = "TELEMETRY_EXPORTER",
        value_enum,
        ignore_case = true,
        default_value = "none"
    )]
    pub exporter: ExporterKind,

    /// Output path for the file exporter
    #[arg(long = "traces-file", env = "TRACES_FILE", default_value = DEFAULT_TRACES_FILE)]
    pub traces_file: PathBuf,

    /// Collector endpoint for the OTLP exporters
    #[arg(long = "otlp-endpoint", env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Value of the `environment` resource attribute
    #[arg(long = "environment", env = "DEPLOYMENT_ENV", default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,

    /// Enable verbose logging (sets log level to debug unless overridden by DEATHSTAR_LOG/RUST_LOG)
    #[arg(
        long,
        short = 'v',
        env = "DEATHSTAR_VERBOSE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(
        long = "no-color",
        env = "NO_COLOR",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,
}
