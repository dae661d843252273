//! Call identifiers and their generator.
//!
//! An id is `name + host + "_" + millis + "_" + counter`. The counter is
//! strictly increasing per generator, so two ids never collide even when
//! minted within the same millisecond.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Token correlating a request with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CallId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for CallId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Mints call ids for one execution context.
#[derive(Debug)]
pub struct CallIdGenerator {
    /// Host identifier of this context.
    host: String,
    /// Next counter value (starts at 1).
    counter: AtomicU64,
    /// Highest timestamp handed out so far.
    last_millis: AtomicI64,
}

impl CallIdGenerator {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            counter: AtomicU64::new(1),
            last_millis: AtomicI64::new(0),
        }
    }

    /// Host identifier embedded in every id.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Mint the next id for a call to `name`.
    pub fn next(&self, name: &str) -> CallId {
        let millis = self.monotonic_millis();
        let index = self.counter.fetch_add(1, Ordering::Relaxed);
        CallId(format!("{}{}_{}_{}", name, self.host, millis, index))
    }

    /// Wall-clock milliseconds, clamped so they never go backwards.
    fn monotonic_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self.last_millis.fetch_max(now, Ordering::Relaxed);
        previous.max(now)
    }
}
