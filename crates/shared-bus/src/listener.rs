//! # Transport Listener
//!
//! Single point of ingestion for inbound cross-document messages. Filters
//! to well-formed envelopes and re-emits them into the [`EventRegistry`]:
//!
//! ```text
//! MessageEvent ──parse──┬── REQUEST  ──→ publish(name)
//!                       ├── RESPONSE ──→ publish("res_" + callId)
//!                       └── anything else ──→ dropped
//! ```
//!
//! Holds no state of its own beyond the registry handle.

use crate::registry::EventRegistry;
use shared_types::{CallEnvelope, Direction, MessageEvent, Transport, TransportError};
use std::sync::Arc;
use tracing::{debug, trace};

/// Where an inbound message was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Published under the call name.
    Request { key: String, handlers: usize },
    /// Published under the per-call response key.
    Response { key: String, handlers: usize },
}

impl Route {
    /// Event key the message was published under.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Route::Request { key, .. } | Route::Response { key, .. } => key,
        }
    }

    /// Number of handlers that received the message.
    #[must_use]
    pub fn handlers(&self) -> usize {
        match self {
            Route::Request { handlers, .. } | Route::Response { handlers, .. } => *handlers,
        }
    }
}

/// Routes inbound messages into the registry.
#[derive(Clone)]
pub struct TransportListener {
    registry: Arc<EventRegistry>,
}

impl TransportListener {
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self { registry }
    }

    /// Register this listener as the transport's inbound handler.
    pub fn install(&self, transport: &dyn Transport) -> Result<(), TransportError> {
        let listener = self.clone();
        transport.on_message(Arc::new(move |event: MessageEvent| {
            listener.handle_message(&event);
        }))?;

        debug!("Transport listener installed");
        Ok(())
    }

    /// Classify and route one inbound message.
    ///
    /// Returns `None` when the message is not a well-formed envelope; such
    /// traffic is ignored without error.
    pub fn handle_message(&self, event: &MessageEvent) -> Option<Route> {
        let envelope = match CallEnvelope::from_value(&event.data) {
            Ok(envelope) => envelope,
            Err(e) => {
                trace!(origin = %event.origin, reason = %e, "Ignoring non-envelope message");
                return None;
            }
        };

        let key = envelope.event_key();
        let handlers = self.registry.publish(&key, &envelope, event);

        trace!(
            direction = %envelope.direction,
            name = %envelope.name,
            call_id = %envelope.call_id,
            handlers = handlers,
            "Envelope routed"
        );

        Some(match envelope.direction {
            Direction::Request => Route::Request { key, handlers },
            Direction::Response => Route::Response { key, handlers },
        })
    }

    /// The registry messages are routed into.
    #[must_use]
    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use shared_types::{CallId, MessageListener};

    fn message(data: Value) -> MessageEvent {
        MessageEvent::new(data, "https://parent.example")
    }

    fn counting_handler(count: &Arc<Mutex<usize>>) -> crate::EventHandler {
        let count = Arc::clone(count);
        Arc::new(move |_, _| *count.lock() += 1)
    }

    #[test]
    fn test_request_routed_by_name() {
        let registry = Arc::new(EventRegistry::new());
        let hits = Arc::new(Mutex::new(0));
        registry.subscribe("ping", counting_handler(&hits));

        let listener = TransportListener::new(Arc::clone(&registry));
        let route = listener
            .handle_message(&message(json!({
                "name": "ping",
                "callId": "ping_1",
                "direction": "REQUEST",
                "payload": "1+1"
            })))
            .unwrap();

        assert_eq!(
            route,
            Route::Request {
                key: "ping".into(),
                handlers: 1
            }
        );
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_response_routed_by_call_id() {
        let registry = Arc::new(EventRegistry::new());
        let by_name = Arc::new(Mutex::new(0));
        let by_id = Arc::new(Mutex::new(0));
        registry.subscribe("ping", counting_handler(&by_name));
        registry.subscribe("res_ping_1", counting_handler(&by_id));

        let listener = TransportListener::new(Arc::clone(&registry));
        let route = listener
            .handle_message(&message(json!({
                "name": "ping",
                "callId": "ping_1",
                "direction": "RESPONSE",
                "result": 2
            })))
            .unwrap();

        assert_eq!(route.key(), "res_ping_1");
        assert_eq!(route.handlers(), 1);
        assert_eq!(*by_name.lock(), 0);
        assert_eq!(*by_id.lock(), 1);
    }

    #[test]
    fn test_unknown_call_id_is_noop() {
        let registry = Arc::new(EventRegistry::new());
        let listener = TransportListener::new(Arc::clone(&registry));

        let route = listener
            .handle_message(&message(json!({
                "name": "ping",
                "callId": "never-sent",
                "direction": "RESPONSE",
                "result": 2
            })))
            .unwrap();

        assert_eq!(route.handlers(), 0);
    }

    #[test]
    fn test_malformed_messages_dropped() {
        let registry = Arc::new(EventRegistry::new());
        let hits = Arc::new(Mutex::new(0));
        registry.subscribe("ping", counting_handler(&hits));
        let listener = TransportListener::new(Arc::clone(&registry));

        for data in [
            json!(null),
            json!("ping"),
            json!({ "name": "ping" }),
            json!({ "name": "ping", "callId": "1" }),
            json!({ "name": "ping", "callId": "", "direction": "REQUEST" }),
            json!({ "name": "ping", "callId": 5, "direction": "REQUEST" }),
            json!({ "name": "ping", "callId": "1", "direction": "request" }),
        ] {
            assert!(listener.handle_message(&message(data)).is_none());
        }

        assert_eq!(*hits.lock(), 0);
        assert_eq!(registry.events_published(), 0);
    }

    struct CapturingTransport {
        listener: Mutex<Option<MessageListener>>,
    }

    impl Transport for CapturingTransport {
        fn post_message(&self, _data: Value, _target_origin: &str) -> Result<(), TransportError> {
            Ok(())
        }

        fn on_message(&self, listener: MessageListener) -> Result<(), TransportError> {
            *self.listener.lock() = Some(listener);
            Ok(())
        }
    }

    #[test]
    fn test_install_wires_inbound_messages() {
        let registry = Arc::new(EventRegistry::new());
        let hits = Arc::new(Mutex::new(0));
        registry.subscribe("ping", counting_handler(&hits));

        let transport = CapturingTransport {
            listener: Mutex::new(None),
        };
        TransportListener::new(Arc::clone(&registry))
            .install(&transport)
            .unwrap();

        let inbound = transport.listener.lock().clone().unwrap();
        let envelope = CallEnvelope::request("ping", CallId::from("ping_9"), "");
        inbound(message(envelope.to_value().unwrap()));

        assert_eq!(*hits.lock(), 1);
    }
}
