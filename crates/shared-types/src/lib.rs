//! # Shared Types Crate
//!
//! Wire types and ports shared by every part of the cross-document RPC
//! channel: the `CallEnvelope`, call identifiers, the error taxonomy and the
//! `Transport` trait.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the envelope layout lives here and nowhere else.
//! - **Errors as Data**: responder failures travel as `RemoteError` values;
//!   caller failures surface as one `CallError` type.
//! - **Transport Agnostic**: nothing here knows how messages cross documents.

pub mod call_id;
pub mod envelope;
pub mod errors;
pub mod transport;

pub use call_id::{CallId, CallIdGenerator};
pub use envelope::{response_key, CallEnvelope, Direction, RESPONSE_KEY_PREFIX};
pub use errors::*;
pub use transport::{origin_matches, MessageEvent, MessageListener, Transport, ANY_ORIGIN};
