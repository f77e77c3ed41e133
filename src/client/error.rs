//! Client error types

use thiserror::Error;

/// Errors that can occur when talking to the sentiment backend
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Cannot build request URL for {path}: no API base or page origin configured")]
    NoBaseUrl { path: String },
}

impl ClientError {
    /// Classify a transport error the way the rest of the client reports it
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Unavailable(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Request(err)
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
