//! # Overlapping Calls
//!
//! Responses are matched purely by call id: overlapping same-name calls never
//! resolve each other, whatever order their responses arrive in.

#[cfg(test)]
mod tests {
    use crate::support::{settle, DelayedEcho, Fixed, Frames, CHILD_ORIGIN};
    use cm_channel::CallRequest;
    use serde_json::json;
    use shared_types::{CallEnvelope, CallId, RemoteError, Transport};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_reverse_order_responses() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        let echo = DelayedEcho::new();
        frames.child.accept_with("echo", echo.clone());

        let (slow, fast) = tokio::join!(
            frames.parent.call(CallRequest::new("echo", "slow:300")),
            frames.parent.call(CallRequest::new("echo", "fast:10")),
        );

        assert_eq!(slow?, json!("slow"));
        assert_eq!(fast?, json!("fast"));
        assert_eq!(echo.executions(), 2);
        assert_eq!(frames.parent.pending_stats().completed, 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_overlapping_calls() -> anyhow::Result<()> {
        let frames = Arc::new(Frames::new()?);
        frames.child.accept_with("echo", DelayedEcho::new());

        let mut handles = Vec::new();
        for i in 0..20u64 {
            let frames = Arc::clone(&frames);
            handles.push(tokio::spawn(async move {
                let payload = format!("call{}:{}", i, 200 - i * 10);
                frames.parent.call(CallRequest::new("echo", payload)).await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await??, json!(format!("call{}", i)));
        }
        assert_eq!(frames.parent.pending_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_latest_responder_wins() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept_with("who", Arc::new(Fixed(json!("first"))));
        frames.child.accept_with("who", Arc::new(Fixed(json!("second"))));

        let result = frames.parent.call(CallRequest::new("who", "")).await?;

        assert_eq!(result, json!("second"));
        assert_eq!(frames.child.registry().handler_count("who"), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_call_id_is_ignored() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept_with("echo", DelayedEcho::new());

        let call = frames
            .parent
            .call(CallRequest::new("echo", "real:100").with_target_origin(CHILD_ORIGIN));
        let intruder = async {
            settle().await;
            assert_eq!(frames.parent.pending_count(), 1);

            let forged = CallEnvelope::request("echo", CallId::from("echounknown_1_1"), "")
                .respond(Err(RemoteError::new("Error", "forged", "")));
            frames
                .child_window
                .post_message(forged.to_value()?, "*")?;
            settle().await;

            assert_eq!(frames.parent.pending_count(), 1);
            anyhow::Ok(())
        };

        let (result, intruded) = tokio::join!(call, intruder);
        intruded?;
        assert_eq!(result?, json!("real"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_after_timeout_is_dropped() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept_with("echo", DelayedEcho::new());

        let error = frames
            .parent
            .call(CallRequest::new("echo", "late:500").with_timeout(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(error.is_timeout());

        // Let the child finish and answer into the void.
        tokio::time::sleep(Duration::from_millis(600)).await;
        settle().await;

        let stats = frames.parent.pending_stats();
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.completed, 0);
        assert_eq!(frames.parent.pending_count(), 0);
        Ok(())
    }
}
