//! # Call Scenarios
//!
//! A caller in the parent page invoking a named operation in the child frame:
//!
//! 1. **ping**: `1+1` evaluated by the default interpreter resolves with `2`
//! 2. **no responder**: the call rejects with kind `"timeout"` after exactly
//!    its timeout
//! 3. **remote failure**: the executor's error message reaches the caller
//! 4. **panic**: an executor panic is reported, not propagated

#[cfg(test)]
mod tests {
    use crate::support::{Frames, CHILD_ORIGIN};
    use cm_channel::{
        CallError, CallRequest, DisabledExecutor, ExecutionError, ExecutionRequest, FnExecutor,
        EXECUTION_DISABLED_KIND, PANIC_KIND,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_ping_resolves_with_two() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept("ping");

        let started = Instant::now();
        let result = frames
            .parent
            .call(
                CallRequest::new("ping", "1+1")
                    .with_target_origin(CHILD_ORIGIN)
                    .with_timeout(Duration::from_millis(1000)),
            )
            .await?;

        assert_eq!(result, json!(2));
        assert!(started.elapsed() < Duration::from_millis(1000));
        assert_eq!(frames.parent.pending_count(), 0);
        assert_eq!(frames.parent.pending_stats().completed, 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_responder_times_out() -> anyhow::Result<()> {
        let frames = Frames::new()?;

        let started = Instant::now();
        let error = frames
            .parent
            .call(CallRequest::new("ping", "1+1").with_timeout(Duration::from_millis(1000)))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(error.kind(), "timeout");
        assert!(elapsed >= Duration::from_millis(1000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1100), "{elapsed:?}");
        assert_eq!(frames.parent.pending_count(), 0);
        assert_eq!(frames.parent.registry().event_count(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_timeout_from_config() -> anyhow::Result<()> {
        let frames = Frames::with_timeout(Duration::from_millis(250))?;

        let started = Instant::now();
        let error = frames
            .parent
            .call(CallRequest::new("nobody", ""))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            CallError::Timeout {
                timeout_ms: 250,
                ..
            }
        ));
        assert!(started.elapsed() >= Duration::from_millis(250));
        Ok(())
    }

    #[tokio::test]
    async fn test_remote_failure_reaches_caller() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept_with(
            "fail",
            Arc::new(FnExecutor::new(|_req: ExecutionRequest| async move {
                Err(ExecutionError::new("Error", "boom"))
            })),
        );

        let error = frames
            .parent
            .call(CallRequest::new("fail", ""))
            .await
            .unwrap_err();

        assert!(error.message().contains("boom"));
        assert_eq!(error.kind(), "Error");
        assert_eq!(error.to_remote().message, "boom");
        Ok(())
    }

    #[tokio::test]
    async fn test_script_errors_reach_caller() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept("eval");

        let thrown = frames
            .parent
            .call(CallRequest::new("eval", "throw 'boom'"))
            .await
            .unwrap_err();
        assert_eq!(thrown.kind(), "ThrownError");
        assert!(thrown.message().contains("boom"));

        let missing = frames
            .parent
            .call(CallRequest::new("eval", "window + 1"))
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), "ReferenceError");
        Ok(())
    }

    #[tokio::test]
    async fn test_executor_panic_is_reported() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept_with(
            "explode",
            Arc::new(FnExecutor::new(|_req: ExecutionRequest| async move {
                if true {
                    panic!("kaboom");
                }
                Ok(Value::Null)
            })),
        );

        let error = frames
            .parent
            .call(CallRequest::new("explode", ""))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), PANIC_KIND);

        // The child keeps answering after the panic.
        frames.child.accept("ping");
        let result = frames.parent.call(CallRequest::new("ping", "2*3")).await?;
        assert_eq!(result, json!(6));
        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_execution() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames
            .child
            .accept_with("ping", Arc::new(DisabledExecutor));

        let error = frames
            .parent
            .call(CallRequest::new("ping", "1+1"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), EXECUTION_DISABLED_KIND);
        Ok(())
    }

    #[tokio::test]
    async fn test_calls_in_both_directions() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.parent.accept("ask-parent");
        frames.child.accept("ask-child");

        let (from_child, from_parent) = tokio::join!(
            frames.child.call(CallRequest::new("ask-parent", "'p' + 1")),
            frames.parent.call(CallRequest::new("ask-child", "'c' + 2")),
        );

        assert_eq!(from_child?, json!("p1"));
        assert_eq!(from_parent?, json!("c2"));
        Ok(())
    }
}
