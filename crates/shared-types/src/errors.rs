//! # Error Types
//!
//! Defines error types shared by both ends of the channel.

use crate::call_id::CallId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error kind reported when a call receives no response in time.
pub const TIMEOUT_KIND: &str = "timeout";

/// Error kind reported when the transport refused a request.
pub const TRANSPORT_KIND: &str = "transport";

/// Structured failure carried in the `error` field of a RESPONSE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Failure class name.
    pub kind: String,
    /// Human-readable text.
    pub message: String,
    /// Diagnostic trace.
    #[serde(default)]
    pub detail: String,
}

impl RemoteError {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RemoteError {}

/// Reasons an inbound message is not a usable envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Message data is not a JSON object.
    #[error("message data is not an object")]
    NotAnObject,

    /// Required field missing, mistyped or unknown enum value.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Required field present but empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A REQUEST carried `result` or `error`.
    #[error("request envelope carries an outcome")]
    RequestWithOutcome,

    /// A RESPONSE carried both `result` and `error`.
    #[error("response envelope carries both result and error")]
    AmbiguousOutcome,
}

/// Errors raised by a transport primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer document is gone.
    #[error("target window detached")]
    Detached,

    /// The delivery queue is closed.
    #[error("transport closed")]
    Closed,

    /// Delivery needs an async runtime and none is running.
    #[error("no async runtime available for message delivery")]
    NoRuntime,

    /// Envelope could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<EnvelopeError> for TransportError {
    fn from(e: EnvelopeError) -> Self {
        TransportError::Serialization(e.to_string())
    }
}

/// Failure of a call, as seen by the caller.
///
/// Timeouts and reported executor failures share one shape; they differ
/// only by [`CallError::kind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// No RESPONSE arrived within the configured window.
    #[error("call {call_id} timed out after {timeout_ms}ms")]
    Timeout { call_id: CallId, timeout_ms: u64 },

    /// The responder reported a failure.
    #[error("remote error: {0}")]
    Remote(RemoteError),

    /// The request could not be sent.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl CallError {
    /// Failure kind: `"timeout"`, `"transport"`, or the remote kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            CallError::Timeout { .. } => TIMEOUT_KIND,
            CallError::Remote(error) => &error.kind,
            CallError::Transport(_) => TRANSPORT_KIND,
        }
    }

    /// Human-readable failure text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            CallError::Remote(error) => error.message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns true if the call expired without a response.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::Timeout { .. })
    }

    /// The failure in its wire shape.
    #[must_use]
    pub fn to_remote(&self) -> RemoteError {
        match self {
            CallError::Remote(error) => error.clone(),
            other => RemoteError::new(other.kind(), other.message(), ""),
        }
    }
}

impl From<RemoteError> for CallError {
    fn from(e: RemoteError) -> Self {
        CallError::Remote(e)
    }
}
