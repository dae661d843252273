//! # Cross-Document Channel Test Suite
//!
//! End-to-end scenarios between two (or one) in-memory windows, each with
//! its own `CorsChannel`.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs         # Window fixtures, test executors, tracing setup
//! └── integration/
//!     ├── scenarios.rs   # ping, timeout, remote failure
//!     ├── concurrency.rs # overlapping calls, responder replacement
//!     └── transport.rs   # origin filtering, loopback, malformed traffic
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cm-tests
//! cargo test -p cm-tests integration::concurrency::
//! ```

pub mod integration;
pub mod support;
