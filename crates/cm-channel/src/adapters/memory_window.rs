//! In-memory window pair implementing [`Transport`].
//!
//! A window delivers to its connected peer, or to itself when it has none
//! (a page talking to its own window). Delivery is asynchronous: posted
//! messages are queued on the target's inbox and dispatched to its
//! listeners by a pump task started with the first listener.

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shared_types::{origin_matches, MessageEvent, MessageListener, Transport, TransportError};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// An in-process stand-in for a browser window.
pub struct MemoryWindow {
    origin: String,
    inbox: mpsc::UnboundedSender<MessageEvent>,
    /// Receiving end, taken by the pump once it starts.
    pump: Mutex<Option<mpsc::UnboundedReceiver<MessageEvent>>>,
    listeners: Arc<RwLock<Vec<MessageListener>>>,
    peer: RwLock<Option<Weak<MemoryWindow>>>,
    this: Weak<MemoryWindow>,
}

impl MemoryWindow {
    /// A standalone window that delivers to itself.
    pub fn new(origin: impl Into<String>) -> Arc<Self> {
        let (inbox, rx) = mpsc::unbounded_channel();
        let origin = origin.into();

        Arc::new_cyclic(|this| Self {
            origin,
            inbox,
            pump: Mutex::new(Some(rx)),
            listeners: Arc::new(RwLock::new(Vec::new())),
            peer: RwLock::new(None),
            this: this.clone(),
        })
    }

    /// Two windows connected to each other (e.g. a page and its iframe).
    pub fn pair(origin_a: impl Into<String>, origin_b: impl Into<String>) -> (Arc<Self>, Arc<Self>) {
        let a = Self::new(origin_a);
        let b = Self::new(origin_b);
        Self::connect(&a, &b);
        (a, b)
    }

    /// Connect two windows so each posts to the other.
    pub fn connect(a: &Arc<Self>, b: &Arc<Self>) {
        *a.peer.write() = Some(Arc::downgrade(b));
        *b.peer.write() = Some(Arc::downgrade(a));
        debug!(a = %a.origin, b = %b.origin, "Windows connected");
    }

    /// Origin of this window's document.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn target(&self) -> Result<Arc<Self>, TransportError> {
        let target = match &*self.peer.read() {
            Some(peer) => peer.upgrade(),
            None => self.this.upgrade(),
        };
        target.ok_or(TransportError::Detached)
    }

    fn start_pump(&self, runtime: &Handle, mut rx: mpsc::UnboundedReceiver<MessageEvent>) {
        let listeners = Arc::clone(&self.listeners);
        let origin = self.origin.clone();

        runtime.spawn(async move {
            while let Some(event) = rx.recv().await {
                let snapshot: Vec<MessageListener> = listeners.read().clone();
                for listener in snapshot {
                    listener(event.clone());
                }
            }
            trace!(origin = %origin, "Window inbox closed");
        });
    }
}

impl Transport for MemoryWindow {
    fn post_message(&self, data: Value, target_origin: &str) -> Result<(), TransportError> {
        let target = self.target()?;

        if !origin_matches(target_origin, &target.origin) {
            trace!(
                target_origin = target_origin,
                actual = %target.origin,
                "Origin mismatch, message dropped"
            );
            return Ok(());
        }

        target
            .inbox
            .send(MessageEvent::new(data, self.origin.clone()))
            .map_err(|_| TransportError::Closed)
    }

    fn on_message(&self, listener: MessageListener) -> Result<(), TransportError> {
        let mut pump = self.pump.lock();

        if let Some(rx) = pump.take() {
            let runtime = match Handle::try_current() {
                Ok(runtime) => runtime,
                Err(_) => {
                    *pump = Some(rx);
                    return Err(TransportError::NoRuntime);
                }
            };
            self.start_pump(&runtime, rx);
        }

        self.listeners.write().push(listener);
        Ok(())
    }
}
