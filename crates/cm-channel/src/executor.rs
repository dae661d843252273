//! Executor port and the stock executors.
//!
//! The responder never evaluates payloads itself; it hands every request to
//! an [`Executor`]. Hosts pick between the sandboxed
//! [`ScriptInterpreter`](crate::interpreter::ScriptInterpreter), a
//! closure-backed [`FnExecutor`], or [`DisabledExecutor`].

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{CallId, RemoteError};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// Kind reported by [`DisabledExecutor`].
pub const EXECUTION_DISABLED_KIND: &str = "ExecutionDisabled";

/// Kind reported when an executor panics.
pub const PANIC_KIND: &str = "Panic";

/// One request handed to an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    /// Call name.
    pub name: String,
    /// Id of the call being answered.
    pub call_id: CallId,
    /// Script body or argument data.
    pub payload: String,
    /// Origin of the requesting document.
    pub origin: String,
}

/// Responder-side failure; reported to the caller, never raised locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExecutionError {
    /// Failure class name.
    pub kind: String,
    /// Human-readable text.
    pub message: String,
    /// Diagnostic trace.
    pub detail: String,
}

impl ExecutionError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            detail: String::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Build from any error value, using `kind` as class name and the
    /// debug rendering as detail.
    pub fn from_error<E: std::error::Error>(kind: impl Into<String>, error: &E) -> Self {
        Self::new(kind, error.to_string()).with_detail(format!("{:?}", error))
    }

    pub(crate) fn panicked(message: impl fmt::Display) -> Self {
        Self::new(PANIC_KIND, format!("executor panicked: {}", message))
    }
}

impl From<ExecutionError> for RemoteError {
    fn from(e: ExecutionError) -> Self {
        RemoteError::new(e.kind, e.message, e.detail)
    }
}

/// Produces the outcome of a request.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, request: ExecutionRequest) -> Result<Value, ExecutionError>;
}

/// Executor backed by an async closure.
pub struct FnExecutor<F, Fut> {
    func: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnExecutor<F, Fut>
where
    F: Fn(ExecutionRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ExecutionError>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> Executor for FnExecutor<F, Fut>
where
    F: Fn(ExecutionRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ExecutionError>> + Send + 'static,
{
    async fn execute(&self, request: ExecutionRequest) -> Result<Value, ExecutionError> {
        (self.func)(request).await
    }
}

/// Refuses every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledExecutor;

#[async_trait]
impl Executor for DisabledExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<Value, ExecutionError> {
        Err(ExecutionError::new(
            EXECUTION_DISABLED_KIND,
            format!("script execution is disabled for '{}'", request.name),
        ))
    }
}
