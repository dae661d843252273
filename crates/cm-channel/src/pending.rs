//! Pending Call Store - bridges the response event back to the awaiting call.
//!
//! Maps call ids to the completion channel of calls still waiting for a
//! response.
//!
//! Flow:
//! 1. The caller mints a `CallId` and calls `register()` to get a receiver
//! 2. The caller sends the REQUEST
//! 3. The response handler calls `complete()` with the transported outcome
//! 4. Or the timeout path calls `expire()`
//!
//! Whichever of `complete()` / `expire()` runs first removes the entry, so a
//! call reaches exactly one terminal state.

use dashmap::DashMap;
use serde_json::Value;
use shared_types::{CallId, RemoteError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::debug;

/// Outcome delivered to a waiting call.
pub type CallOutcome = Result<Value, RemoteError>;

/// A call waiting for its response.
struct PendingCall {
    /// Channel completing the call.
    sender: oneshot::Sender<CallOutcome>,
    /// When the call was issued.
    created_at: Instant,
    /// Call name (for logging).
    name: String,
    /// Timeout for this call.
    timeout: Duration,
}

/// Counters for the pending call store.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Calls registered.
    pub registered: AtomicU64,
    /// Calls completed by a response.
    pub completed: AtomicU64,
    /// Calls that expired without a response.
    pub timed_out: AtomicU64,
    /// Calls abandoned (send failure or dropped future).
    pub cancelled: AtomicU64,
}

/// Point-in-time copy of [`PendingStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingStatsSnapshot {
    pub registered: u64,
    pub completed: u64,
    pub timed_out: u64,
    pub cancelled: u64,
}

/// Outstanding calls of one caller.
pub struct PendingCallStore {
    pending: DashMap<CallId, PendingCall>,
    stats: Arc<PendingStats>,
}

impl PendingCallStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Register a call and get the receiver its outcome arrives on.
    pub fn register(
        &self,
        call_id: CallId,
        name: &str,
        timeout: Duration,
    ) -> oneshot::Receiver<CallOutcome> {
        let (tx, rx) = oneshot::channel();

        let call = PendingCall {
            sender: tx,
            created_at: Instant::now(),
            name: name.to_string(),
            timeout,
        };

        debug!(
            call_id = %call_id,
            name = name,
            timeout_ms = timeout.as_millis(),
            "Registered pending call"
        );
        self.pending.insert(call_id, call);
        self.stats.registered.fetch_add(1, Ordering::Relaxed);

        rx
    }

    /// Complete a call with its transported outcome.
    ///
    /// Returns false if the call is unknown, already finished, or its
    /// receiver is gone.
    pub fn complete(&self, call_id: &CallId, outcome: CallOutcome) -> bool {
        let Some((_, call)) = self.pending.remove(call_id) else {
            debug!(call_id = %call_id, "Response for unknown or expired call");
            return false;
        };

        let elapsed = call.created_at.elapsed();
        let failed = outcome.is_err();

        if call.sender.send(outcome).is_err() {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(call_id = %call_id, name = %call.name, "Pending call receiver dropped");
            return false;
        }

        self.stats.completed.fetch_add(1, Ordering::Relaxed);
        debug!(
            call_id = %call_id,
            name = %call.name,
            failed = failed,
            response_time_ms = elapsed.as_millis(),
            "Completed pending call"
        );
        true
    }

    /// Drop a call whose timeout fired. Returns false if it had already
    /// completed.
    pub fn expire(&self, call_id: &CallId) -> bool {
        let Some((_, call)) = self.pending.remove(call_id) else {
            return false;
        };

        self.stats.timed_out.fetch_add(1, Ordering::Relaxed);
        debug!(
            call_id = %call_id,
            name = %call.name,
            elapsed_ms = call.created_at.elapsed().as_millis(),
            timeout_ms = call.timeout.as_millis(),
            "Pending call timed out"
        );
        true
    }

    /// Drop a call that will never be answered (send failure, dropped future).
    pub fn cancel(&self, call_id: &CallId) -> bool {
        if self.pending.remove(call_id).is_some() {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Number of calls still waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `call_id` is still waiting.
    #[must_use]
    pub fn is_pending(&self, call_id: &CallId) -> bool {
        self.pending.contains_key(call_id)
    }

    #[must_use]
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }

    #[must_use]
    pub fn snapshot(&self) -> PendingStatsSnapshot {
        PendingStatsSnapshot {
            registered: self.stats.registered.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            timed_out: self.stats.timed_out.load(Ordering::Relaxed),
            cancelled: self.stats.cancelled.load(Ordering::Relaxed),
        }
    }
}

impl Default for PendingCallStore {
    fn default() -> Self {
        Self::new()
    }
}
