//! Fan-out of concurrent workers and aggregation of their outcomes.
mod coordinator;
mod outcome;
mod reporter;
mod tally;
mod worker;


pub use coordinator::run;
pub use outcome::{FailureKind, FailureReason, WorkerOutcome, WorkerReport, classify};
pub use tally::{Aggregator, RunReport, RunTally};
