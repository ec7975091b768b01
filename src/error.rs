//! Error types for tws-client.

use thiserror::Error;

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum TwsError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection closed while an operation was in flight.
    #[error("Connection closed")]
    ConnectionClosed,

    /// No correlated response arrived before the deadline.
    #[error("Timeout waiting for response")]
    Timeout,

    /// The request needs a server capability the negotiated version lacks.
    /// Raised at encode time, before anything is queued.
    #[error("Server version {required} required for {feature}")]
    Capability {
        /// Human-readable name of the missing capability.
        feature: &'static str,
        /// Minimum server version that supports it.
        required: i32,
    },

    /// Malformed or unexpected frame (bad length, bad token, wrong shape).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error frame tied to a request id.
    #[error("Request error {code}: {message}")]
    Request {
        /// Broker error code.
        code: i32,
        /// Broker error text.
        message: String,
    },

    /// Dispatch queue is at its configured maximum depth.
    #[error("Dispatch queue full")]
    QueueFull,
}

impl TwsError {
    pub(crate) fn bad_token(what: &str, token: &str) -> Self {
        TwsError::Protocol(format!("invalid {} field: {:?}", what, token))
    }

    pub(crate) fn unexpected_response() -> Self {
        TwsError::Protocol("response resolved with an unexpected record kind".into())
    }
}

/// Result type alias using TwsError.
pub type Result<T> = std::result::Result<T, TwsError>;
