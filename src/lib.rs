//! SDG Portal - client for the SDG information portal.
//!
//! This library provides the client side of the portal: a chat panel backed
//! by the SDG question-answering service, an activity analytics dashboard,
//! and a passive activity tracker that reports interactions to the backend
//! logging API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         SDG Portal                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │ Interaction │──▶│  Activity   │──▶│    Sink     │──┐     │
//! │  │   Source    │   │  Tracker    │   │ (best-eff.) │  │     │
//! │  └─────────────┘   └─────────────┘   └─────────────┘  │     │
//! │                           ▲                           ▼     │
//! │  ┌─────────────┐          │                  ┌─────────────┐│
//! │  │ Chat Panel  │──────────┴─────────────────▶│ API Client  ││
//! │  └─────────────┘                             │  (reqwest)  ││
//! │  ┌─────────────┐                             │             ││
//! │  │  Dashboard  │────────────────────────────▶│             ││
//! │  └─────────────┘                             └─────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sdg_portal::{ActivityTracker, ChannelSource, Config, HttpSink, PageContext};
//! use sdg_portal::{api::ApiClient, auth::FileTokenStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
//! let api = ApiClient::from_config(&config, tokens)?;
//!
//! let source = Arc::new(ChannelSource::new(PageContext::new("http://localhost/", "Home")));
//! let host = source.handle();
//! let tracker = ActivityTracker::new(source, Arc::new(HttpSink::new(api)), config.tracker_config());
//! tracker.start()?;
//!
//! // Interaction events are delivered through `host`.
//! # drop(host);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod diagnostics;
pub mod interaction;
pub mod session;
pub mod tracker;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use api::{ApiClient, ApiError};
pub use auth::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use chat::{ChatMessage, ChatPanel, Role};
pub use config::{Config, ConfigError};
pub use dashboard::{ActivityAnalytics, ActivityDashboard, TimeRange};
pub use diagnostics::{DispatchFailure, DispatchStats};
pub use interaction::{ChannelSource, ElementInfo, HostEvent, HostHandle, InteractionSource, PageContext};
pub use tracker::{ActivitySink, ActivityTracker, HttpSink, LogEntry, TrackerConfig, TrackerError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
