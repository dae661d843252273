//! Channel construction errors.

use crate::config::ConfigError;
use shared_types::TransportError;
use thiserror::Error;

/// Errors raised while setting up a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),
}
