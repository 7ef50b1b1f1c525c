//! Core library for the `deathstar` CLI.
//!
//! `deathstar` fans out a fixed number of concurrent workers against one HTTP
//! endpoint. Each worker sends a single request through a retrying client, and
//! the run ends with a tally of how many calls came back with the expected
//! status. Spans and counters go to a pluggable telemetry backend.
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod runner;
pub(crate) mod system;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
