//! # Transport Port
//!
//! The cross-document messaging primitive the channel consumes. Hosts
//! supply an implementation (a browser window binding, an in-memory window
//! for tests, ...). Attaching and detaching the underlying listener is the
//! host's business; the channel only installs itself once.

use crate::errors::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Target origin that matches any receiving document.
pub const ANY_ORIGIN: &str = "*";

/// A raw inbound cross-document message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Message data as posted by the sender.
    pub data: Value,
    /// Origin of the sending document.
    pub origin: String,
}

impl MessageEvent {
    pub fn new(data: Value, origin: impl Into<String>) -> Self {
        Self {
            data,
            origin: origin.into(),
        }
    }
}

/// Callback receiving every inbound message.
pub type MessageListener = Arc<dyn Fn(MessageEvent) + Send + Sync>;

/// Fire-and-forget delivery to another document.
pub trait Transport: Send + Sync {
    /// Post `data` to the target document if its origin matches
    /// `target_origin` (or `target_origin` is `"*"`).
    fn post_message(&self, data: Value, target_origin: &str) -> Result<(), TransportError>;

    /// Register a listener for inbound messages.
    fn on_message(&self, listener: MessageListener) -> Result<(), TransportError>;
}

/// Returns true if a message posted to `target_origin` may be delivered to a
/// document whose origin is `origin`.
#[must_use]
pub fn origin_matches(target_origin: &str, origin: &str) -> bool {
    target_origin == ANY_ORIGIN || target_origin == origin
}
