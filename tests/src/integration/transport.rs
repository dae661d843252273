//! # Window Transport Behaviour
//!
//! Origin filtering, same-window messaging and tolerance of foreign traffic
//! sharing the message channel.

#[cfg(test)]
mod tests {
    use crate::support::{init_tracing, settle, Fixed, Frames, CHILD_ORIGIN, PARENT_ORIGIN};
    use cm_channel::adapters::MemoryWindow;
    use cm_channel::{CallRequest, ChannelConfig, CorsChannel};
    use serde_json::json;
    use shared_types::Transport;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_request_to_wrong_origin_is_not_delivered() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept("ping");

        let error = frames
            .parent
            .call(
                CallRequest::new("ping", "1+1")
                    .with_target_origin("https://elsewhere.example")
                    .with_timeout(Duration::from_millis(500)),
            )
            .await
            .unwrap_err();

        assert!(error.is_timeout());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_origin_is_honoured() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames
            .child
            .accept_to("ping", None, "https://elsewhere.example");

        let error = frames
            .parent
            .call(CallRequest::new("ping", "1+1").with_timeout(Duration::from_millis(500)))
            .await
            .unwrap_err();
        assert!(error.is_timeout());

        frames.child.accept_to("ping", None, PARENT_ORIGIN);
        let result = frames
            .parent
            .call(CallRequest::new("ping", "1+1").with_target_origin(CHILD_ORIGIN))
            .await?;
        assert_eq!(result, json!(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_executor_sees_caller_origin() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept_with(
            "whoami",
            Arc::new(cm_channel::FnExecutor::new(
                |req: cm_channel::ExecutionRequest| async move { Ok(json!(req.origin)) },
            )),
        );

        let result = frames.parent.call(CallRequest::new("whoami", "")).await?;
        assert_eq!(result, json!(PARENT_ORIGIN));
        Ok(())
    }

    #[tokio::test]
    async fn test_same_window_channels() -> anyhow::Result<()> {
        init_tracing();
        let window = MemoryWindow::new("https://app.example");

        let caller = CorsChannel::new(ChannelConfig::for_host("app.example"), window.clone())?;
        let answerer = CorsChannel::new(ChannelConfig::for_host("app.example"), window.clone())?;
        answerer.accept_with("config", Arc::new(Fixed(json!({ "theme": "dark" }))));

        let result = caller
            .call(CallRequest::new("config", "").with_target_origin("https://app.example"))
            .await?;

        assert_eq!(result, json!({ "theme": "dark" }));
        assert_eq!(window.listener_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_traffic_is_ignored() -> anyhow::Result<()> {
        let frames = Frames::new()?;
        frames.child.accept("ping");

        let junk = [
            json!("hello"),
            json!(42),
            json!([1, 2, 3]),
            json!({ "type": "analytics", "event": "click" }),
            json!({ "name": "ping", "direction": "REQUEST", "payload": "1+1" }),
            json!({ "name": "ping", "callId": "x", "direction": "SIDEWAYS" }),
            json!({ "name": "", "callId": "x", "direction": "REQUEST" }),
            json!({ "name": "ping", "callId": "x", "direction": "RESPONSE",
                    "result": 1, "error": { "kind": "Error", "message": "both" } }),
        ];
        for data in junk {
            frames.parent_window.post_message(data, "*")?;
        }
        settle().await;

        assert_eq!(frames.child.registry().events_published(), 0);

        let result = frames.parent.call(CallRequest::new("ping", "1+1")).await?;
        assert_eq!(result, json!(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_detached_child_fails_fast() -> anyhow::Result<()> {
        let Frames {
            parent,
            child_window,
            child,
            ..
        } = Frames::new()?;
        drop(child);
        drop(child_window);

        let error = parent
            .call(CallRequest::new("ping", "1+1"))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), "transport");
        assert_eq!(parent.pending_count(), 0);
        assert_eq!(parent.pending_stats().cancelled, 1);
        Ok(())
    }
}
