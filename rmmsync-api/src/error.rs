//! Error types for rmmsync-api.

use thiserror::Error;

/// All errors that can arise from remote API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("API returned status {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The response body was not the JSON shape the sync depends on.
    #[error("unexpected response from {url}: {reason}")]
    BadResponse { url: String, reason: String },
}

impl ApiError {
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => Self::Status {
                url: url.to_string(),
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => Self::Transport {
                url: url.to_string(),
                reason: transport.to_string(),
            },
        }
    }
}
