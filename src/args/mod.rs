//! CLI/environment argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::RunArgs;
pub use types::{ExporterKind, HttpMethod};

pub(crate) use defaults::{DEFAULT_USER_AGENT, MAX_CONCURRENCY};
