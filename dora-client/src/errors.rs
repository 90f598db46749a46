use http::StatusCode;
use thiserror::Error;

/// Result type alias for dora-client operations
pub type Result<T, E = DoraError> = std::result::Result<T, E>;

/// A single request to a metrics service that did not produce a usable body.
///
/// Aggregations turn these into `None` entries; single-endpoint calls return
/// them to the caller.
#[derive(Error, Debug)]
pub enum RequestFailure {
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("invalid response body from {url}: {reason}")]
    InvalidBody { url: String, reason: String },
}

/// Errors that can occur during dora-client operations
#[derive(Error, Debug)]
pub enum DoraError {
    #[error(transparent)]
    Request(#[from] RequestFailure),

    #[error("Service registry error: {0}")]
    Registry(#[from] registry::RegistryError),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}
