//! Shared fixtures for the integration scenarios.

use async_trait::async_trait;
use cm_channel::adapters::MemoryWindow;
use cm_channel::{ChannelConfig, CorsChannel, ExecutionError, ExecutionRequest, Executor};
use cm_telemetry::{init_telemetry, log_call_event, TelemetryConfig, TelemetryGuard};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub const PARENT_ORIGIN: &str = "https://parent.example";
pub const CHILD_ORIGIN: &str = "https://child.example";

static TELEMETRY: OnceLock<Option<TelemetryGuard>> = OnceLock::new();

/// Install test logging once per process. Set `CM_LOG_LEVEL` to change the
/// filter.
pub fn init_tracing() {
    TELEMETRY.get_or_init(|| {
        let mut config = TelemetryConfig::for_tests();
        if let Ok(level) = std::env::var("CM_LOG_LEVEL") {
            config.log_level = level;
        }
        init_telemetry(config).ok()
    });
}

/// A page and its iframe, each with a channel.
pub struct Frames {
    pub parent_window: Arc<MemoryWindow>,
    pub child_window: Arc<MemoryWindow>,
    pub parent: CorsChannel,
    pub child: CorsChannel,
}

impl Frames {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_timeout(Duration::from_millis(cm_channel::DEFAULT_CALL_TIMEOUT_MS))
    }

    /// Frames whose channels default to `timeout`.
    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        init_tracing();

        let (parent_window, child_window) = MemoryWindow::pair(PARENT_ORIGIN, CHILD_ORIGIN);
        let timeout_ms = u64::try_from(timeout.as_millis())?;

        let parent = CorsChannel::new(
            ChannelConfig {
                default_timeout_ms: timeout_ms,
                ..ChannelConfig::for_host("parent.example")
            },
            parent_window.clone(),
        )?;
        let child = CorsChannel::new(
            ChannelConfig {
                default_timeout_ms: timeout_ms,
                ..ChannelConfig::for_host("child.example")
            },
            child_window.clone(),
        )?;

        Ok(Self {
            parent_window,
            child_window,
            parent,
            child,
        })
    }
}

/// Let queued window deliveries and spawned executors run.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Executor answering `"label:delay_ms"` with `"label"` after `delay_ms`.
#[derive(Default)]
pub struct DelayedEcho {
    executions: AtomicUsize,
}

impl DelayedEcho {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for DelayedEcho {
    async fn execute(&self, request: ExecutionRequest) -> Result<Value, ExecutionError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        log_call_event!(debug, "Echo executing", request.name, request.call_id);

        let (label, delay) = request
            .payload
            .split_once(':')
            .ok_or_else(|| ExecutionError::new("TypeError", "expected 'label:delay_ms'"))?;
        let delay: u64 = delay
            .parse()
            .map_err(|e| ExecutionError::from_error("TypeError", &e))?;

        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(Value::from(label))
    }
}

/// Executor that always answers with `value`.
pub struct Fixed(pub Value);

#[async_trait]
impl Executor for Fixed {
    async fn execute(&self, _request: ExecutionRequest) -> Result<Value, ExecutionError> {
        Ok(self.0.clone())
    }
}
