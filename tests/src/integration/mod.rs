//! Cross-window integration scenarios.

mod concurrency;
mod scenarios;
mod transport;
