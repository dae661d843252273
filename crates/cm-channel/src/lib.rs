//! Cross-document RPC channel.
//!
//! Lets two execution contexts (a page and an iframe, two windows, or a
//! window and itself) call named operations on each other through a
//! fire-and-forget messaging [`Transport`](shared_types::Transport).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── CorsChannel ─────────────────────────────┐
//! │                                                                      │
//! │  Transport ──► TransportListener ──► EventRegistry                   │
//! │                                        │            │                │
//! │                          REQUEST {name}│            │ RESPONSE res_* │
//! │                                        ▼            ▼                │
//! │                                   Responder       Caller             │
//! │                                        │            │                │
//! │                                   Executor   PendingCallStore        │
//! │                                        │      (oneshot bridge)       │
//! │                                        ▼                             │
//! │                              RESPONSE ──► Transport                  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use cm_channel::{adapters::MemoryWindow, CallRequest, ChannelConfig, CorsChannel};
//!
//! let (parent, child) = MemoryWindow::pair("https://parent.example", "https://child.example");
//! let child_channel = CorsChannel::new(ChannelConfig::for_host("child.example"), child)?;
//! child_channel.accept("ping");
//!
//! let parent_channel = CorsChannel::new(ChannelConfig::for_host("parent.example"), parent)?;
//! let two = parent_channel.call(CallRequest::new("ping", "1+1")).await?;
//! ```

pub mod adapters;
pub mod caller;
pub mod config;
pub mod error;
pub mod executor;
pub mod interpreter;
pub mod pending;
pub mod responder;
pub mod service;

pub use caller::{CallRequest, Caller};
pub use config::{ChannelConfig, ConfigError, DEFAULT_CALL_TIMEOUT_MS};
pub use error::ChannelError;
pub use executor::{
    DisabledExecutor, ExecutionError, ExecutionRequest, Executor, FnExecutor,
    EXECUTION_DISABLED_KIND, PANIC_KIND,
};
pub use interpreter::ScriptInterpreter;
pub use pending::{PendingCallStore, PendingStatsSnapshot};
pub use responder::Responder;
pub use service::CorsChannel;

// Re-export the wire types callers handle directly.
pub use shared_types::{CallError, CallId, RemoteError, Transport, TransportError};
