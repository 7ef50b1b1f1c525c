use thiserror::Error;

/// Why the last attempt of a retried call did not produce a terminal response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("status {0}")]
    Status(u16),
    #[error("{message}")]
    Transport { message: String, timed_out: bool },
}

impl From<&reqwest::Error> for AttemptError {
    fn from(err: &reqwest::Error) -> Self {
        AttemptError::Transport {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build request: {source}")]
    BuildRequestFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Request failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("Giving up after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: AttemptError },
}
