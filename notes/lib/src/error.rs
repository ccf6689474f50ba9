//! Error type for Notes API operations.
//!
//! Every failure an operation can hit collapses into [`NotesError`]: transport
//! problems surface as [`NotesError::Request`], non-success responses as
//! [`NotesError::HttpStatus`] with the body text preserved as the message.

use thiserror::Error;

/// Errors that can occur when talking to the Notes API.
#[derive(Debug, Error)]
pub enum NotesError {
    /// The request could not be completed (connection, timeout, or body decode).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server responded with a non-success status code.
    #[error("server returned HTTP {status}: {message}")]
    HttpStatus {
        /// HTTP status code returned by the server.
        status: u16,
        /// Response body text, or the status line when the body was unreadable.
        message: String,
    },

    /// The request URL could not be constructed from the base URL.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// The configured API key is not a valid header value.
    #[error("API key is not a valid header value")]
    InvalidApiKey,
}

impl NotesError {
    /// Returns the HTTP status code associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if retrying the same request could plausibly succeed.
    ///
    /// Timeouts and connection failures are retryable, as are 408/429 and all
    /// 5xx responses. Other client errors (bad auth, malformed request) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => {
                matches!(*status, 408 | 429) || (500..600).contains(status)
            }
            Self::Url(_) | Self::InvalidApiKey => false,
        }
    }
}
