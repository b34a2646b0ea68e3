//! Error types for backend and payload operations.

use thiserror::Error;

use crate::constants::{EVERYTHING_LABELED, NO_SUCH_ITEM};

/// Errors that can occur while talking to the dataset backend.
#[derive(Error, Debug)]
pub enum Error {
    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Transport {
        /// HTTP status code
        status: u16,
        /// Response body, kept verbatim for display
        body: String,
    },

    /// The request itself failed (connection, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame image could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error while reading a response body
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A completion carried a payload of the wrong kind
    #[error("Unexpected payload: expected {expected}")]
    UnexpectedPayload {
        /// The payload kind the caller waited for
        expected: &'static str,
    },
}

impl Error {
    /// Create a transport error from a status and body.
    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body: body.into(),
        }
    }

    /// Create an unexpected payload error.
    pub fn unexpected(expected: &'static str) -> Self {
        Self::UnexpectedPayload { expected }
    }

    /// Text for the user-visible error channel.
    ///
    /// Transport errors show the response body verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Error::Transport { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        }
    }

    /// The unlabeled pool is exhausted.
    pub fn is_everything_labeled(&self) -> bool {
        matches!(self, Error::Transport { body, .. } if body.contains(EVERYTHING_LABELED))
    }

    /// The requested item does not exist.
    pub fn is_no_such_item(&self) -> bool {
        matches!(self, Error::Transport { body, .. } if body.contains(NO_SUCH_ITEM))
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_body_verbatim() {
        let err = Error::transport(400, "no item with key foo in dataset bar");
        assert_eq!(err.user_message(), "no item with key foo in dataset bar");
    }

    #[test]
    fn test_user_message_without_body() {
        let err = Error::transport(502, "");
        assert_eq!(err.user_message(), "HTTP 502: ");
    }

    #[test]
    fn test_classification() {
        assert!(Error::transport(400, "everything has been labeled already\n").is_everything_labeled());
        assert!(Error::transport(404, "no such item").is_no_such_item());
        assert!(!Error::unexpected("json").is_no_such_item());
    }
}
