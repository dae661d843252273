//! # Channel Service
//!
//! Wires the registry, transport listener, responder and caller of one
//! execution context together. The host constructs a `CorsChannel` for its
//! window and shares it (`Arc<CorsChannel>`) with whatever needs to call or
//! answer.
//!
//! ```text
//! Transport ──► TransportListener ──► EventRegistry ──┬─► Responder ──► Executor
//!     ▲                                               └─► Caller (res_{callId})
//!     └──────────────── post_message ◄────────────────────┘
//! ```

use crate::caller::{CallRequest, Caller};
use crate::config::ChannelConfig;
use crate::error::ChannelError;
use crate::executor::Executor;
use crate::interpreter::ScriptInterpreter;
use crate::pending::PendingStatsSnapshot;
use crate::responder::Responder;
use serde_json::Value;
use shared_bus::{EventRegistry, TransportListener};
use shared_types::{CallError, Transport};
use std::sync::Arc;
use tracing::info;

/// Cross-document call channel of one execution context.
pub struct CorsChannel {
    config: ChannelConfig,
    registry: Arc<EventRegistry>,
    responder: Responder,
    caller: Caller,
}

impl CorsChannel {
    /// Channel evaluating accepted requests with the [`ScriptInterpreter`].
    pub fn new(config: ChannelConfig, transport: Arc<dyn Transport>) -> Result<Self, ChannelError> {
        Self::with_executor(config, transport, Arc::new(ScriptInterpreter::new()))
    }

    /// Channel with a custom default executor.
    pub fn with_executor(
        config: ChannelConfig,
        transport: Arc<dyn Transport>,
        default_executor: Arc<dyn Executor>,
    ) -> Result<Self, ChannelError> {
        config.validate()?;

        let registry = Arc::new(EventRegistry::new());
        TransportListener::new(Arc::clone(&registry)).install(transport.as_ref())?;

        let responder = Responder::new(
            Arc::clone(&registry),
            Arc::clone(&transport),
            default_executor,
        );
        let caller = Caller::new(
            Arc::clone(&registry),
            transport,
            config.host.clone(),
            config.default_timeout(),
            config.default_target_origin.clone(),
        );

        info!(
            host = %config.host,
            default_timeout_ms = config.default_timeout_ms,
            "Cross-document channel ready"
        );

        Ok(Self {
            config,
            registry,
            responder,
            caller,
        })
    }

    /// Answer requests for `name` with the default executor.
    pub fn accept(&self, name: &str) {
        self.responder
            .accept(name, None, &self.config.default_target_origin);
    }

    /// Answer requests for `name` with `executor`.
    pub fn accept_with(&self, name: &str, executor: Arc<dyn Executor>) {
        self.responder
            .accept(name, Some(executor), &self.config.default_target_origin);
    }

    /// Answer requests for `name`, posting responses to `target_origin`.
    pub fn accept_to(&self, name: &str, executor: Option<Arc<dyn Executor>>, target_origin: &str) {
        self.responder.accept(name, executor, target_origin);
    }

    /// Stop answering requests for `name`.
    pub fn reject(&self, name: &str) -> bool {
        self.responder.reject(name)
    }

    #[must_use]
    pub fn is_accepting(&self, name: &str) -> bool {
        self.responder.is_accepting(name)
    }

    /// Call `request.name` on the other side and wait for its result.
    pub async fn call(&self, request: CallRequest) -> Result<Value, CallError> {
        self.caller.call(request).await
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.caller.pending_count()
    }

    #[must_use]
    pub fn pending_stats(&self) -> PendingStatsSnapshot {
        self.caller.pending().snapshot()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }
}
