//! # Event Registry
//!
//! Name-keyed subscription table. Pure in-memory dispatch with no knowledge
//! of messaging.
//!
//! Dispatch works on a snapshot of the handler list taken before the first
//! handler runs. Handlers may therefore subscribe or unsubscribe freely
//! (a response handler removes itself, for example) without affecting the
//! pass in progress, and no lock is held while a handler runs.

use parking_lot::RwLock;
use shared_types::{CallEnvelope, MessageEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Callback invoked with the parsed envelope and the raw transport event.
pub type EventHandler = Arc<dyn Fn(&CallEnvelope, &MessageEvent) + Send + Sync>;

/// Identifies one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// The subscription table.
pub struct EventRegistry {
    /// Event name -> handlers in registration order.
    handlers: RwLock<HashMap<String, Vec<(SubscriptionId, EventHandler)>>>,

    /// Source of subscription ids.
    next_id: AtomicU64,

    /// Total publish calls.
    events_published: AtomicU64,
}

impl EventRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            events_published: AtomicU64::new(0),
        }
    }

    /// Register `handler` under `name`, after any existing handlers.
    pub fn subscribe(&self, name: impl Into<String>, handler: EventHandler) -> SubscriptionId {
        let name = name.into();
        let id = self.allocate_id();

        let mut handlers = self.handlers.write();
        handlers.entry(name.clone()).or_default().push((id, handler));
        debug!(event = %name, subscription = id.0, "Handler subscribed");

        id
    }

    /// Replace every handler under `name` with `handler`.
    pub fn subscribe_exclusive(
        &self,
        name: impl Into<String>,
        handler: EventHandler,
    ) -> SubscriptionId {
        let name = name.into();
        let id = self.allocate_id();

        let mut handlers = self.handlers.write();
        let replaced = handlers
            .insert(name.clone(), vec![(id, handler)])
            .map_or(0, |previous| previous.len());
        debug!(
            event = %name,
            subscription = id.0,
            replaced = replaced,
            "Handler subscribed exclusively"
        );

        id
    }

    /// Remove all handlers for `name`. Returns how many were removed.
    pub fn unsubscribe(&self, name: &str) -> usize {
        let removed = self
            .handlers
            .write()
            .remove(name)
            .map_or(0, |previous| previous.len());

        if removed > 0 {
            debug!(event = %name, removed = removed, "Handlers unsubscribed");
        }
        removed
    }

    /// Invoke every handler registered for `name`, in registration order.
    ///
    /// Returns the number of handlers invoked. Publishing to a name with no
    /// handlers is a no-op.
    pub fn publish(&self, name: &str, envelope: &CallEnvelope, event: &MessageEvent) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let snapshot: Vec<EventHandler> = match self.handlers.read().get(name) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => {
                trace!(event = %name, "No handlers for event");
                return 0;
            }
        };

        for handler in &snapshot {
            handler(envelope, event);
        }

        trace!(event = %name, handlers = snapshot.len(), "Event dispatched");
        snapshot.len()
    }

    /// Returns true if at least one handler is registered for `name`.
    #[must_use]
    pub fn has_subscribers(&self, name: &str) -> bool {
        self.handler_count(name) > 0
    }

    /// Number of handlers registered for `name`.
    #[must_use]
    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers.read().get(name).map_or(0, Vec::len)
    }

    /// Number of names with at least one handler.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Total publish calls so far.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}
