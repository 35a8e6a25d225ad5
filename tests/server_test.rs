//! Integration tests for the local ingest server

#[cfg(feature = "server")]
mod server_tests {
    use sdg_portal::server::{run, ServerConfig, ServerState};
    use sdg_portal::tracker::{Activity, ActivitySink, BrowserActivityType, LogEntry, SinkFuture};
    use sdg_portal::{ActivityTracker, ChannelSource, PageContext, TrackerConfig};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    impl ActivitySink for RecordingSink {
        fn send(&self, entry: LogEntry) -> SinkFuture {
            self.entries.lock().unwrap().push(entry);
            Box::pin(async { Ok(()) })
        }
    }

    async fn start_server() -> (
        std::net::SocketAddr,
        tokio::sync::oneshot::Sender<()>,
        ActivityTracker,
        Arc<RecordingSink>,
    ) {
        let source = Arc::new(ChannelSource::new(PageContext::new("http://localhost/", "Home")));
        let host = source.handle();
        let sink = Arc::new(RecordingSink::default());
        let tracker = ActivityTracker::new(source, sink.clone(), TrackerConfig::default());
        tracker.start().expect("Failed to start tracker");

        let (addr, shutdown_tx) = run(ServerConfig::new(0), ServerState::new(host, tracker.clone()))
            .await
            .expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        (addr, shutdown_tx, tracker, sink)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (addr, shutdown_tx, _tracker, _sink) = start_server().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["tracking"], true);
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_events_feed_the_tracker() {
        let (addr, shutdown_tx, tracker, sink) = start_server().await;

        let click = serde_json::json!({
            "page": {"url": "http://localhost/goals/13", "title": "SDG 13"},
            "event": {
                "kind": "click",
                "target": {"tag_name": "A", "id": "", "class_name": "goal-card highlighted"},
                "x": 40,
                "y": 80
            }
        });

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/events", addr))
            .json(&click)
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["session_id"], tracker.session_id().as_str());

        tokio::time::sleep(Duration::from_millis(100)).await;

        let entries = sink.entries.lock().unwrap().clone();
        let click = entries
            .iter()
            .find_map(|e| match &e.activity {
                Activity::Browser(b) if b.activity_type == BrowserActivityType::Click => Some(b.clone()),
                _ => None,
            })
            .expect("click was not recorded");

        assert_eq!(click.element_id.as_deref(), Some("goal-card"));
        assert_eq!(click.element_type.as_deref(), Some("a"));
        assert_eq!(click.page_url, "http://localhost/goals/13");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_malformed_event_rejected() {
        let (addr, shutdown_tx, _tracker, _sink) = start_server().await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/events", addr))
            .json(&serde_json::json!({"event": {"kind": "teleport"}}))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_client_error());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let (addr, shutdown_tx, tracker, _sink) = start_server().await;
        tracker.track_search("affordable energy", None);

        let client = reqwest::Client::new();
        let body: serde_json::Value = client
            .get(format!("http://{}/stats", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");

        assert_eq!(body["search_dispatched"], 1);
        assert_eq!(body["page_dispatched"], 1);
        assert_eq!(body["browser_dispatched"], 1);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_cors_admits_extension_and_local_origins() {
        let (addr, shutdown_tx, _tracker, _sink) = start_server().await;

        let client = reqwest::Client::new();
        let preflight = |origin: &'static str| {
            client
                .request(reqwest::Method::OPTIONS, format!("http://{}/events", addr))
                .header("Origin", origin)
                .header("Access-Control-Request-Method", "POST")
                .header("Access-Control-Request-Headers", "content-type")
                .send()
        };

        for origin in [
            "chrome-extension://abcdefghijklmnop",
            "http://localhost:3000",
            "http://localhost",
        ] {
            let response = preflight(origin).await.expect("Failed to send request");
            assert!(response.status().is_success(), "preflight failed for {origin}");
            let allowed = response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok());
            assert_eq!(allowed, Some(origin));
        }

        let response = preflight("https://example.com")
            .await
            .expect("Failed to send request");
        assert!(response.headers().get("access-control-allow-origin").is_none());

        let _ = shutdown_tx.send(());
    }
}
