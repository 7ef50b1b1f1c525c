//! Retrying HTTP request execution.
mod client;
mod retry;


pub use client::{AttemptHooks, Response, RetryingClient};
pub use retry::{RetryPolicy, is_retriable_status};
