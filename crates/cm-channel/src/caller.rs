//! Caller (requester) - issues REQUEST envelopes and awaits their RESPONSE.
//!
//! Each call mints a fresh [`CallId`], subscribes a one-shot handler under
//! `res_{callId}` before sending, and then races the response against its
//! timeout. Exactly one of {response, timeout, send failure} decides the
//! outcome and the response subscription never outlives the call.

use crate::pending::{CallOutcome, PendingCallStore};
use serde_json::Value;
use shared_bus::EventRegistry;
use shared_types::{
    response_key, CallEnvelope, CallError, CallId, CallIdGenerator, MessageEvent, Transport,
    TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Parameters of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Call name, must match an accepted name on the remote side.
    pub name: String,
    /// Opaque payload handed to the remote executor.
    pub payload: String,
    /// Origin to post to; the channel default when `None`.
    pub target_origin: Option<String>,
    /// Timeout; the channel default when `None`.
    pub timeout: Option<Duration>,
}

impl CallRequest {
    pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
            target_origin: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_target_origin(mut self, target_origin: impl Into<String>) -> Self {
        self.target_origin = Some(target_origin.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Issues calls over a transport.
pub struct Caller {
    registry: Arc<EventRegistry>,
    transport: Arc<dyn Transport>,
    pending: Arc<PendingCallStore>,
    ids: CallIdGenerator,
    default_timeout: Duration,
    default_target_origin: String,
}

impl Caller {
    pub fn new(
        registry: Arc<EventRegistry>,
        transport: Arc<dyn Transport>,
        host: impl Into<String>,
        default_timeout: Duration,
        default_target_origin: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            transport,
            pending: Arc::new(PendingCallStore::new()),
            ids: CallIdGenerator::new(host),
            default_timeout,
            default_target_origin: default_target_origin.into(),
        }
    }

    /// Send a request and wait for its response.
    ///
    /// # Errors
    ///
    /// - [`CallError::Remote`] when the responder reported a failure
    /// - [`CallError::Timeout`] when no response arrived in time
    /// - [`CallError::Transport`] when the request could not be sent
    pub async fn call(&self, request: CallRequest) -> Result<Value, CallError> {
        let CallRequest {
            name,
            payload,
            target_origin,
            timeout,
        } = request;
        let timeout = timeout.unwrap_or(self.default_timeout);
        let target_origin = target_origin.unwrap_or_else(|| self.default_target_origin.clone());

        let call_id = self.ids.next(&name);
        let key = response_key(&call_id);
        let mut rx = self.pending.register(call_id.clone(), &name, timeout);

        // Subscribe before sending so an immediate response is not missed.
        self.registry
            .subscribe(key.clone(), self.response_handler(key.clone()));
        let mut guard = CallGuard {
            registry: Arc::clone(&self.registry),
            pending: Arc::clone(&self.pending),
            key,
            call_id: call_id.clone(),
            armed: true,
        };

        let data = CallEnvelope::request(name.as_str(), call_id.clone(), payload)
            .to_value()
            .map_err(TransportError::from)?;

        if let Err(e) = self.transport.post_message(data, &target_origin) {
            warn!(name = %name, call_id = %call_id, error = %e, "Failed to send request");
            return Err(CallError::Transport(e));
        }
        debug!(name = %name, call_id = %call_id, target_origin = %target_origin, "Request sent");

        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(outcome)) => {
                guard.disarm();
                outcome.map_err(CallError::Remote)
            }
            // The store dropped the sender without answering; the guard cleans up.
            Ok(Err(_)) => Err(CallError::Transport(TransportError::Closed)),
            Err(_) => {
                self.registry.unsubscribe(&guard.key);
                if self.pending.expire(&call_id) {
                    guard.disarm();
                    warn!(
                        name = %name,
                        call_id = %call_id,
                        timeout_ms = timeout.as_millis(),
                        "Call timed out"
                    );
                    return Err(CallError::Timeout {
                        call_id,
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    });
                }

                // The response won the race after the timer fired.
                guard.disarm();
                match rx.try_recv() {
                    Ok(outcome) => outcome.map_err(CallError::Remote),
                    Err(_) => Err(CallError::Transport(TransportError::Closed)),
                }
            }
        }
    }

    /// Handler for `res_{callId}`: removes itself, then completes the call.
    fn response_handler(&self, key: String) -> shared_bus::EventHandler {
        let registry = Arc::downgrade(&self.registry);
        let pending = Arc::clone(&self.pending);

        Arc::new(move |envelope: &CallEnvelope, _event: &MessageEvent| {
            if !envelope.is_response() {
                return;
            }
            if let Some(registry) = registry.upgrade() {
                registry.unsubscribe(&key);
            }
            let outcome: CallOutcome = envelope.outcome();
            pending.complete(&envelope.call_id, outcome);
        })
    }

    /// Number of calls still waiting for a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    /// The store tracking outstanding calls.
    #[must_use]
    pub fn pending(&self) -> &PendingCallStore {
        &self.pending
    }

    /// Host identifier embedded in call ids.
    #[must_use]
    pub fn host(&self) -> &str {
        self.ids.host()
    }
}

/// Removes the response subscription and pending entry of a call that ends
/// without a response: send failure, or the call future being dropped.
struct CallGuard {
    registry: Arc<EventRegistry>,
    pending: Arc<PendingCallStore>,
    key: String,
    call_id: CallId,
    armed: bool,
}

impl CallGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        if self.armed {
            self.registry.unsubscribe(&self.key);
            if self.pending.cancel(&self.call_id) {
                debug!(call_id = %self.call_id, "Pending call abandoned");
            }
        }
    }
}
