//! Local HTTP ingest for interaction events from the browser extension.
//!
//! The extension listens to DOM events on portal pages and forwards them here;
//! they are fed into the activity tracker through a [`HostHandle`].
//!
//! # Architecture
//!
//! ```text
//! Browser Extension ──→ POST /events ──→ HostHandle ──→ ActivityTracker ──→ api/admin/log/*
//! ```

use crate::interaction::{HostEvent, HostHandle, PageContext};
use crate::tracker::ActivityTracker;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

/// Shared server state
pub struct ServerState {
    host: HostHandle,
    tracker: ActivityTracker,
}

impl ServerState {
    pub fn new(host: HostHandle, tracker: ActivityTracker) -> Self {
        Self { host, tracker }
    }
}

/// One interaction forwarded by the extension.
///
/// The event is discriminated by its `kind` field:
///
/// ```json
/// {"page": {"url": "http://localhost/goals", "title": "Goals"},
///  "event": {"kind": "click", "target": {"tag_name": "BUTTON", "id": "send"}, "x": 10, "y": 20}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Page the event happened on; replaces the current page when present
    #[serde(default)]
    pub page: Option<PageContext>,
    pub event: HostEvent,
}

/// Response from the events endpoint
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub status: String,
    pub session_id: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tracking: bool,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tracking: state.tracker.is_active(),
    })
}

/// POST /events
async fn ingest(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), (StatusCode, Json<ErrorResponse>)> {
    if let Some(page) = request.page {
        state.host.set_page(page);
    }

    if !state.host.emit(request.event) {
        tracing::error!("Tracker event loop is gone, rejecting event");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Activity tracker is not listening".to_string(),
                code: "TRACKER_UNAVAILABLE".to_string(),
            }),
        ));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            status: "accepted".to_string(),
            session_id: state.tracker.session_id(),
        }),
    ))
}

/// GET /stats
async fn stats(State(state): State<Arc<ServerState>>) -> Json<crate::diagnostics::DispatchStats> {
    Json(state.tracker.stats())
}

/// Loopback pages on any port and browser extensions.
fn is_allowed_origin(origin: &str) -> bool {
    const EXTENSION_SCHEMES: [&str; 2] = ["chrome-extension://", "moz-extension://"];
    const LOOPBACK_HOSTS: [&str; 2] = ["http://localhost", "http://127.0.0.1"];

    if EXTENSION_SCHEMES
        .iter()
        .any(|scheme| origin.strip_prefix(scheme).is_some_and(|id| !id.is_empty()))
    {
        return true;
    }

    LOOPBACK_HOSTS.iter().any(|host| match origin.strip_prefix(host) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix(':')
            .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    })
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    state: ServerState,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(state);

    let app = Router::new()
        .route("/health", get(health))
        .route("/events", post(ingest))
        .route("/stats", get(stats))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    origin.to_str().map(is_allowed_origin).unwrap_or(false)
                }))
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Ingest server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins() {
        assert!(is_allowed_origin("http://localhost"));
        assert!(is_allowed_origin("http://localhost:3000"));
        assert!(is_allowed_origin("http://127.0.0.1:8000"));
        assert!(is_allowed_origin("chrome-extension://abcdefghijklmnop"));
        assert!(is_allowed_origin("moz-extension://0f1e2d3c"));

        assert!(!is_allowed_origin("chrome-extension://"));
        assert!(!is_allowed_origin("http://localhost.evil.com"));
        assert!(!is_allowed_origin("http://localhost:"));
        assert!(!is_allowed_origin("http://localhost:80abc"));
        assert!(!is_allowed_origin("https://example.com"));
    }
}
