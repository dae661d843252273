//! # Call Envelope
//!
//! The wire message carried as the data of every cross-document message on
//! the channel.
//!
//! ## Wire Format
//!
//! ```text
//! {
//!   "name":      string,
//!   "callId":    string,
//!   "direction": "REQUEST" | "RESPONSE",
//!   "payload":   string,
//!   "result":    any,                               // RESPONSE only
//!   "error":     { "kind", "message", "detail" }    // RESPONSE only
//! }
//! ```
//!
//! ## Invariants
//!
//! - A REQUEST never carries `result` or `error`.
//! - A RESPONSE carries exactly one of `result` / `error`. A missing or
//!   `null` result on a successful RESPONSE stands for the value `null`.

use crate::call_id::CallId;
use crate::errors::{EnvelopeError, RemoteError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Prefix of the event key under which responses are routed.
pub const RESPONSE_KEY_PREFIX: &str = "res_";

/// Event key for the response to `call_id`.
///
/// Responses are always routed per call, never per name, since several
/// outstanding calls can share a name.
#[must_use]
pub fn response_key(call_id: &CallId) -> String {
    format!("{}{}", RESPONSE_KEY_PREFIX, call_id)
}

/// Whether an envelope asks for work or answers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Sent by a caller, handled by a responder.
    Request,
    /// Sent by a responder, correlated by `callId`.
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => write!(f, "REQUEST"),
            Direction::Response => write!(f, "RESPONSE"),
        }
    }
}

/// The structured message exchanged between two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnvelope {
    /// Name of the remote operation.
    pub name: String,

    /// Correlates a request with its eventual response.
    pub call_id: CallId,

    /// REQUEST or RESPONSE.
    pub direction: Direction,

    /// Script body or argument data. Responses echo the request payload.
    #[serde(default)]
    pub payload: String,

    /// Successful outcome (RESPONSE only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Failed outcome (RESPONSE only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

impl CallEnvelope {
    /// Build a REQUEST envelope.
    pub fn request(name: impl Into<String>, call_id: CallId, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            call_id,
            direction: Direction::Request,
            payload: payload.into(),
            result: None,
            error: None,
        }
    }

    /// Build the RESPONSE answering this envelope.
    ///
    /// Exactly one of `result` / `error` ends up set.
    #[must_use]
    pub fn respond(&self, outcome: Result<Value, RemoteError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(error) => (None, Some(error)),
        };

        Self {
            name: self.name.clone(),
            call_id: self.call_id.clone(),
            direction: Direction::Response,
            payload: self.payload.clone(),
            result,
            error,
        }
    }

    /// Parse and validate an envelope from raw message data.
    ///
    /// Anything that is not a well-formed envelope is rejected, so unrelated
    /// cross-document traffic never reaches the registry.
    pub fn from_value(data: &Value) -> Result<Self, EnvelopeError> {
        if !data.is_object() {
            return Err(EnvelopeError::NotAnObject);
        }

        let envelope: CallEnvelope = serde_json::from_value(data.clone())
            .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

        envelope.validate()?;
        Ok(envelope)
    }

    /// Serialize into message data.
    pub fn to_value(&self) -> Result<Value, EnvelopeError> {
        serde_json::to_value(self).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Check the envelope invariants.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.name.is_empty() {
            return Err(EnvelopeError::MissingField("name"));
        }
        if self.call_id.is_empty() {
            return Err(EnvelopeError::MissingField("callId"));
        }

        match self.direction {
            Direction::Request => {
                if self.result.is_some() || self.error.is_some() {
                    return Err(EnvelopeError::RequestWithOutcome);
                }
            }
            Direction::Response => {
                if self.result.is_some() && self.error.is_some() {
                    return Err(EnvelopeError::AmbiguousOutcome);
                }
            }
        }

        Ok(())
    }

    /// Event key this envelope is published under.
    #[must_use]
    pub fn event_key(&self) -> String {
        match self.direction {
            Direction::Request => self.name.clone(),
            Direction::Response => response_key(&self.call_id),
        }
    }

    /// Outcome carried by a RESPONSE.
    pub fn outcome(&self) -> Result<Value, RemoteError> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self.result.clone().unwrap_or(Value::Null)),
        }
    }

    /// Returns true for REQUEST envelopes.
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.direction == Direction::Request
    }

    /// Returns true for RESPONSE envelopes.
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.direction == Direction::Response
    }
}
