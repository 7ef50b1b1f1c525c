use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Request, header::CONTENT_TYPE};
use tokio::time::sleep;
use tracing::debug;
use url::Url;

use crate::args::DEFAULT_USER_AGENT;
use crate::config::RunConfig;
use crate::error::{AttemptError, HttpError};

use super::retry::{RetryPolicy, is_retriable_error, is_retriable_status, retry_after};

/// Terminal response of a retried call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub attempts: u32,
}

/// Per-attempt observation points. `attempt` is 0 for the first try.
pub trait AttemptHooks: Send {
    fn on_request(&mut self, _url: &Url, _attempt: u32) {}

    fn on_response(&mut self, _url: &Url, _status: u16, _attempt: u32) {}

    fn on_transport_error(&mut self, _url: &Url, _error: &reqwest::Error, _attempt: u32) {}
}

/// A `reqwest` client bound to one request template and a retry policy.
///
/// The retry loop lives here so callers issue exactly one `send` per logical
/// call.
#[derive(Debug, Clone)]
pub struct RetryingClient {
    client: Client,
    policy: RetryPolicy,
    method: reqwest::Method,
    url: Url,
    body: Vec<u8>,
    content_type: Option<String>,
    expected_status: u16,
}

impl RetryingClient {
    /// Builds the client for the configured request and retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn from_config(config: &RunConfig) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })?;

        Ok(Self {
            client,
            policy: config.retry,
            method: config.method.into(),
            url: config.target_url.clone(),
            body: config.body.clone(),
            content_type: config.content_type.clone(),
            expected_status: config.expected_status,
        })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Sends the request, retrying transport failures and retriable statuses
    /// until a terminal response arrives or the attempts run out.
    ///
    /// # Errors
    ///
    /// Returns `RetriesExhausted` when every attempt failed in a retriable way,
    /// `Transport` for a failure that retrying cannot fix, and
    /// `BuildRequestFailed` when the request cannot be assembled.
    pub async fn send(&self, hooks: &mut dyn AttemptHooks) -> Result<Response, HttpError> {
        let mut attempt: u32 = 0;
        loop {
            hooks.on_request(&self.url, attempt);
            let attempts = attempt.saturating_add(1);
            let request = self.build_request()?;

            let (last, wait) = match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    hooks.on_response(&self.url, status, attempt);
                    let server_wait = retry_after(&response);
                    drain_response_body(response).await;
                    if !is_retriable_status(status, self.expected_status) {
                        return Ok(Response { status, attempts });
                    }
                    (
                        AttemptError::Status(status),
                        self.policy.backoff(attempt, server_wait),
                    )
                }
                Err(err) => {
                    hooks.on_transport_error(&self.url, &err, attempt);
                    if !is_retriable_error(&err) {
                        return Err(HttpError::Transport {
                            attempts,
                            source: err,
                        });
                    }
                    (AttemptError::from(&err), self.policy.backoff(attempt, None))
                }
            };

            if attempt >= self.policy.retry_max {
                return Err(HttpError::RetriesExhausted { attempts, last });
            }
            debug!(
                "{} {} failed ({}), retrying in {:?}",
                self.method,
                self.url,
                last,
                wait
            );
            if wait > Duration::ZERO {
                sleep(wait).await;
            }
            attempt = attempts;
        }
    }

    fn build_request(&self) -> Result<Request, HttpError> {
        let mut builder = self
            .client
            .request(self.method.clone(), self.url.clone())
            .body(self.body.clone());
        if let Some(content_type) = self.content_type.as_deref() {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder
            .build()
            .map_err(|err| HttpError::BuildRequestFailed { source: err })
    }
}

async fn drain_response_body(response: reqwest::Response) {
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        if let Err(err) = chunk {
            debug!("Failed to drain response body: {}", err);
            break;
        }
    }
}
