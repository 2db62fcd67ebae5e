//! Error types for the booking API client.
//!
//! # Design
//! Low-level transport failures never reach callers as-is: the client maps
//! them to `Connection`. Structured server errors are split into
//! `RetryableProtocol` (eligible for another attempt) and `Protocol`
//! (surfaced immediately). The retry loop only looks at
//! [`ClientError::failure_kind`].

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::http::TransportError;
use crate::protocol;
use crate::retry::FailureKind;

pub type Result<T> = std::result::Result<T, ClientError>;

/// A structured error returned by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolError {
    /// Protocol error code from the body, if any.
    pub code: Option<i64>,
    pub message: String,
    pub http_status: u16,
    /// The decoded error body, minus `code` and `error`.
    pub details: Map<String, Value>,
}

impl ProtocolError {
    pub fn new(code: Option<i64>, message: impl Into<String>, http_status: u16) -> Self {
        Self {
            code,
            message: message.into(),
            http_status,
            details: Map::new(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.code == Some(protocol::ERROR_EXCEEDED_BURST_LIMIT)
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Why a round-trip failed below the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFailure {
    Timeout,
    Unreachable,
    Other,
}

/// Errors returned by every remote and local operation of this crate.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport could not complete the round-trip.
    #[error("connection error: {message}")]
    Connection {
        message: String,
        failure: ConnectionFailure,
    },

    /// The server returned a structured, non-retryable error.
    #[error("{0}")]
    Protocol(ProtocolError),

    /// The server returned an error that may succeed on another attempt.
    #[error("{0} (retryable)")]
    RetryableProtocol(ProtocolError),

    /// No client has been configured for the operation.
    #[error("API not initialized")]
    NotInitialized,

    /// Invalid use of an entity or query.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// A response body did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    ResponseShape(String),

    /// A success body could not be parsed.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ClientError {
    pub fn connection(message: impl Into<String>) -> Self {
        ClientError::Connection {
            message: message.into(),
            failure: ConnectionFailure::Unreachable,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        ClientError::Connection {
            message: message.into(),
            failure: ConnectionFailure::Timeout,
        }
    }

    /// The protocol error code, when the server supplied one.
    pub fn code(&self) -> Option<i64> {
        match self {
            ClientError::Protocol(e) | ClientError::RetryableProtocol(e) => e.code,
            _ => None,
        }
    }

    pub fn protocol_error(&self) -> Option<&ProtocolError> {
        match self {
            ClientError::Protocol(e) | ClientError::RetryableProtocol(e) => Some(e),
            _ => None,
        }
    }

    /// Classify the error for the retry policy. `None` means never retry.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ClientError::Connection { failure, .. } => match failure {
                ConnectionFailure::Timeout => Some(FailureKind::Timeout),
                ConnectionFailure::Unreachable => Some(FailureKind::ConnectionFailed),
                ConnectionFailure::Other => None,
            },
            ClientError::Deserialization(_) => Some(FailureKind::Parsing),
            ClientError::RetryableProtocol(_) => Some(FailureKind::RetryableProtocol),
            _ => None,
        }
    }

    /// Whether the failure class is transient. Connection and parsing
    /// failures keep their kind after the client has used up its attempts,
    /// so callers can still tell a timeout from a refused connection; only
    /// protocol errors are downgraded, because their variant is the
    /// classification.
    pub fn is_retryable(&self) -> bool {
        self.failure_kind().is_some()
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ClientError::RetryableProtocol(e) if e.is_rate_limited())
    }

    /// Downgrade a retryable protocol error once no attempts remain. Other
    /// errors are returned unchanged.
    pub(crate) fn into_fatal(self) -> Self {
        match self {
            ClientError::RetryableProtocol(e) => ClientError::Protocol(e),
            other => other,
        }
    }

    /// Append the requested class and id to an object-not-found message.
    pub(crate) fn with_lookup_context(self, class_name: &str, object_id: Option<&str>) -> Self {
        match self {
            ClientError::Protocol(mut e)
                if e.code == Some(protocol::ERROR_OBJECT_NOT_FOUND_FOR_GET) =>
            {
                e.message = format!("{}: {class_name}:{}", e.message, object_id.unwrap_or(""));
                ClientError::Protocol(e)
            }
            other => other,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        let failure = match e {
            TransportError::Timeout => ConnectionFailure::Timeout,
            TransportError::Connect(_) => ConnectionFailure::Unreachable,
            TransportError::Other(_) => ConnectionFailure::Other,
        };
        ClientError::Connection {
            message: e.to_string(),
            failure,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code() {
        let err = ClientError::Protocol(ProtocolError::new(Some(209), "invalid session", 400));
        assert_eq!(err.to_string(), "209: invalid session");
        assert_eq!(err.code(), Some(209));
    }

    #[test]
    fn classification() {
        assert_eq!(ClientError::timeout("t").failure_kind(), Some(FailureKind::Timeout));
        assert_eq!(
            ClientError::connection("refused").failure_kind(),
            Some(FailureKind::ConnectionFailed)
        );
        assert!(!ClientError::Argument("x".into()).is_retryable());
        assert!(!ClientError::NotInitialized.is_retryable());
        assert!(!ClientError::from(TransportError::Other("bad uri".into())).is_retryable());
        assert_eq!(
            ClientError::from(TransportError::Timeout).failure_kind(),
            Some(FailureKind::Timeout)
        );
        let retry = ClientError::RetryableProtocol(ProtocolError::new(Some(155), "slow down", 429));
        assert!(retry.is_rate_limited());
        assert!(matches!(retry.into_fatal(), ClientError::Protocol(_)));
    }

    #[test]
    fn not_found_message_gets_lookup_context() {
        let err = ClientError::Protocol(ProtocolError::new(Some(101), "object not found", 404))
            .with_lookup_context("Room", Some("abc"));
        assert_eq!(err.to_string(), "101: object not found: Room:abc");

        let other = ClientError::Protocol(ProtocolError::new(Some(1), "boom", 500))
            .with_lookup_context("Room", Some("abc"));
        assert_eq!(other.to_string(), "1: boom");
    }
}
