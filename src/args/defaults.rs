pub(crate) const DEFAULT_USER_AGENT: &str = concat!("deathstar/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_METHOD: &str = "GET";
pub(crate) const DEFAULT_CONCURRENCY: usize = 5;
pub(crate) const MAX_CONCURRENCY: usize = 1_000_000;
pub(crate) const DEFAULT_RETRY_MAX: u32 = 3;
pub(crate) const DEFAULT_EXPECTED_STATUS: u16 = 200;
pub(crate) const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub(crate) const DEFAULT_TRACES_FILE: &str = "traces.txt";
pub(crate) const DEFAULT_ENVIRONMENT: &str = "demo";
