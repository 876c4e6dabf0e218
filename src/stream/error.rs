//! Typed errors for the stream transport.

use thiserror::Error;

/// Errors raised while opening or reading the event stream.
///
/// All variants are terminal for the session: the client performs no
/// retries, leaving retry/backoff of per-site probes to the backend.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// The backend could not be reached at all.
    #[error("cannot connect to search backend at {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered, but not with a stream.
    #[error("search backend returned HTTP {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    /// The open stream dropped mid-search.
    #[error("stream transport failed")]
    Transport(#[from] reqwest::Error),
}
