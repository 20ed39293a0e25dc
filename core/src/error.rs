//! Error types for request steps.
//!
//! # Design
//! A transport failure means no response arrived at all, so it is kept apart
//! from the errors synthesized while interpreting a response that did arrive.
//! `Status` and `Parse` carry the raw body so the message shows exactly what
//! the server sent.

use thiserror::Error;

/// Network-level failure reported by the HTTP client (connection refused,
/// DNS failure, timeout, unreadable body).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors a request step completes with.
#[derive(Debug, Error)]
pub enum StepError {
    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A text or JSON step received a status outside 200..300.
    #[error("Received {status} response: {body}")]
    Status { status: u16, body: String },

    /// A JSON step received a 2xx body that is not valid JSON.
    #[error("Could not parse JSON from body: {body}")]
    Parse { body: String },

    /// The options could not be derived from the previous result.
    #[error("Could not resolve request options: {0}")]
    InvalidOptions(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_embeds_code_and_body() {
        let err = StepError::Status {
            status: 500,
            body: "BANG".to_string(),
        };
        assert_eq!(err.to_string(), "Received 500 response: BANG");
    }

    #[test]
    fn parse_message_embeds_body() {
        let err = StepError::Parse {
            body: "not json".to_string(),
        };
        assert_eq!(err.to_string(), "Could not parse JSON from body: not json");
    }

    #[test]
    fn transport_message_is_forwarded_unchanged() {
        let err = StepError::from(TransportError::new("connection refused"));
        assert_eq!(err.to_string(), "connection refused");
    }
}
