//! Responder (acceptor) - answers REQUEST envelopes for accepted call names.
//!
//! One responder per call name; the latest `accept` wins. Every request is
//! executed on its own task and always answered with a RESPONSE carrying
//! exactly one of `result` / `error`. Executor failures, panics included,
//! become data in the `error` field and never escape into the host.

use crate::executor::{ExecutionError, ExecutionRequest, Executor};
use shared_bus::{EventHandler, EventRegistry};
use shared_types::{CallEnvelope, MessageEvent, RemoteError, Transport};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Answers requests for accepted call names.
///
/// Handlers live in the registry, which the transport's listeners keep
/// alive, so they only hold the transport weakly.
pub struct Responder {
    registry: Arc<EventRegistry>,
    transport: Arc<dyn Transport>,
    default_executor: Arc<dyn Executor>,
}

impl Responder {
    pub fn new(
        registry: Arc<EventRegistry>,
        transport: Arc<dyn Transport>,
        default_executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            registry,
            transport,
            default_executor,
        }
    }

    /// Start answering requests for `name`, replacing any previous responder.
    ///
    /// Uses `executor` when given, the default executor otherwise. Responses
    /// are posted to `target_origin`.
    pub fn accept(&self, name: &str, executor: Option<Arc<dyn Executor>>, target_origin: &str) {
        let executor = executor.unwrap_or_else(|| Arc::clone(&self.default_executor));
        let transport = Arc::downgrade(&self.transport);
        let target_origin = target_origin.to_string();

        let handler: EventHandler = Arc::new(move |envelope: &CallEnvelope, event: &MessageEvent| {
            if !envelope.is_request() {
                return;
            }

            let Ok(runtime) = Handle::try_current() else {
                warn!(
                    name = %envelope.name,
                    call_id = %envelope.call_id,
                    "No async runtime, request left unanswered"
                );
                return;
            };

            runtime.spawn(answer(
                Arc::clone(&executor),
                Weak::clone(&transport),
                envelope.clone(),
                event.origin.clone(),
                target_origin.clone(),
            ));
        });

        self.registry.subscribe_exclusive(name, handler);
        debug!(name = name, "Accepting requests");
    }

    /// Stop answering requests for `name`. Returns true if a responder was
    /// registered.
    pub fn reject(&self, name: &str) -> bool {
        let removed = self.registry.unsubscribe(name) > 0;
        if removed {
            debug!(name = name, "No longer accepting requests");
        }
        removed
    }

    /// Whether a responder is registered for `name`.
    #[must_use]
    pub fn is_accepting(&self, name: &str) -> bool {
        self.registry.has_subscribers(name)
    }
}

/// Execute one request and post its RESPONSE.
async fn answer(
    executor: Arc<dyn Executor>,
    transport: Weak<dyn Transport>,
    request: CallEnvelope,
    origin: String,
    target_origin: String,
) {
    let execution = ExecutionRequest {
        name: request.name.clone(),
        call_id: request.call_id.clone(),
        payload: request.payload.clone(),
        origin,
    };

    // A separate task confines executor panics to a JoinError.
    let task = tokio::spawn(async move { executor.execute(execution).await });
    let outcome = match task.await {
        Ok(result) => result,
        Err(join_error) => Err(ExecutionError::panicked(join_error)),
    };

    let outcome = outcome.map_err(|error| {
        warn!(
            name = %request.name,
            call_id = %request.call_id,
            kind = %error.kind,
            error = %error.message,
            "Request failed"
        );
        RemoteError::from(error)
    });

    let response = request.respond(outcome);
    let data = match response.to_value() {
        Ok(data) => data,
        Err(e) => {
            warn!(call_id = %request.call_id, error = %e, "Failed to encode response");
            return;
        }
    };

    let Some(transport) = transport.upgrade() else {
        debug!(
            name = %request.name,
            call_id = %request.call_id,
            "Transport gone, response dropped"
        );
        return;
    };

    match transport.post_message(data, &target_origin) {
        Ok(()) => debug!(
            name = %request.name,
            call_id = %request.call_id,
            failed = response.error.is_some(),
            "Response sent"
        ),
        Err(e) => warn!(
            name = %request.name,
            call_id = %request.call_id,
            error = %e,
            "Failed to send response"
        ),
    }
}
