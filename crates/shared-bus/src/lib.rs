//! # Shared Bus - Event Registry and Transport Listener
//!
//! In-memory dispatch for the cross-document RPC channel.
//!
//! ```text
//!  inbound message ──→ ┌───────────────────┐  publish(key)  ┌──────────────┐
//!                      │ TransportListener │ ─────────────→ │ EventRegistry│
//!                      └───────────────────┘                └──────┬───────┘
//!                                                                  │
//!                                       Responder (key = name) ←───┤
//!                                 Caller (key = "res_" + callId) ←─┘
//! ```
//!
//! The registry's table is the only shared mutable state of the channel.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod listener;
pub mod registry;

pub use listener::{Route, TransportListener};
pub use registry::{EventHandler, EventRegistry, SubscriptionId};
