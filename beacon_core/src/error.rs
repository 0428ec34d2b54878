/**
 * Error types for the delivery core.
 *
 * Two families live here:
 * - `TransportError` — the outcome of one failed send attempt. It always
 *   carries the exact payload bytes that did not make it, so the caller can
 *   inspect or re-queue them.
 * - `Error` — everything that happens *around* a send: resolving settings,
 *   building sessions, looking up client implementations.
 */
use thiserror::Error;

use crate::protocol::constants::SERVICE_NAME;

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// The three ways a single send attempt can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The collector answered, but with a non-2xx status.
    Rejected,

    /// No response classification was available before the deadline.
    TimedOut,

    /// The collector could not be reached at all.
    ConnectionFailed,
}

/**
 * A failed send attempt.
 *
 * `Display` renders only the human-readable message; the offending payload is
 * available through `payload()` / `into_payload()`.
 */
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    status: Option<u16>,
    payload: Vec<u8>,
}

impl TransportError {
    /**
     * The collector responded with `status`. `body` is the decoded response
     * text and is embedded verbatim in the message.
     */
    pub fn rejected(status: u16, body: &str, payload: Vec<u8>) -> Self {
        Self {
            kind: TransportErrorKind::Rejected,
            message: format!("{SERVICE_NAME} server responded with HTTP {status}: {body}"),
            status: Some(status),
            payload,
        }
    }

    pub fn timed_out(payload: Vec<u8>) -> Self {
        Self {
            kind: TransportErrorKind::TimedOut,
            message: format!("Connection to {SERVICE_NAME} server timed out"),
            status: None,
            payload,
        }
    }

    pub fn connection_failed(cause: impl std::fmt::Display, payload: Vec<u8>) -> Self {
        Self {
            kind: TransportErrorKind::ConnectionFailed,
            message: format!("Unable to reach {SERVICE_NAME} server: {cause}"),
            status: None,
            payload,
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of a rejected attempt; `None` for the other kinds.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// The exact bytes that were handed to the transport.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors raised while configuring, constructing, or resolving clients.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured client identifier does not name a registered
    /// implementation.
    #[error("unknown client implementation: {0}")]
    UnknownClient(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error, e.g. the worker thread could not be spawned.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings document could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP session backing a transport could not be built.
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Result type alias for beacon_core.
pub type Result<T> = std::result::Result<T, Error>;
