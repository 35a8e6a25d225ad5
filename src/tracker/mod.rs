//! Passive activity tracking.
//!
//! [`ActivityTracker`] listens to an [`InteractionSource`], encodes host
//! events into activity records and posts them through an [`ActivitySink`].
//! Every dispatch is best-effort: failures are logged, counted and handed to
//! the diagnostics callback, never retried.
//!
//! ```text
//!  InteractionSource ──▶ event loop ──▶ encoders ──▶ ActivitySink ──▶ api/admin/log/*
//!                                          ▲
//!  UI code ── track_search / track_form_activity
//! ```

pub mod element;
pub mod records;
pub mod sink;

pub use element::{identify, truncate_id, InteractionPath, MAX_ELEMENT_ID_LEN};
pub use records::{
    Activity, ActivityKind, BrowserActivity, BrowserActivityType, BrowserMetadata, FormActivity,
    LogEntry, PageActivity, SearchRecord,
};
pub use sink::{ActivitySink, HttpSink, SinkFuture};

use crate::diagnostics::{DiagnosticsCallback, DispatchFailure, DispatchLog, DispatchStats};
use crate::interaction::{ElementInfo, HostEvent, InteractionSource, ScrollMetrics, SourceError};
use crate::session::generate_session_id;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Search type used when the caller gives none.
pub const DEFAULT_SEARCH_TYPE: &str = "general";

/// Timer settings for the tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Quiet window after the last scroll event before it is reported
    pub scroll_debounce: Duration,
    /// Delay before the page-load that follows a history navigation
    pub navigation_settle: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            scroll_debounce: Duration::from_millis(1000),
            navigation_settle: Duration::from_millis(100),
        }
    }
}

/// Errors that can occur when starting the tracker.
#[derive(Debug)]
pub enum TrackerError {
    /// The interaction source refused the attachment
    Source(SourceError),
    /// `start` was called outside a Tokio runtime
    NoRuntime,
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::Source(e) => write!(f, "Interaction source error: {e}"),
            TrackerError::NoRuntime => write!(f, "Activity tracker requires a Tokio runtime"),
        }
    }
}

impl std::error::Error for TrackerError {}

impl From<SourceError> for TrackerError {
    fn from(e: SourceError) -> Self {
        TrackerError::Source(e)
    }
}

struct TrackerState {
    session_id: String,
    page_start: Instant,
    scroll_timer: Option<JoinHandle<()>>,
}

struct Inner {
    source: Arc<dyn InteractionSource>,
    sink: Arc<dyn ActivitySink>,
    config: TrackerConfig,
    state: Mutex<TrackerState>,
    active: AtomicBool,
    attached: AtomicBool,
    log: DispatchLog,
    diagnostics: Mutex<Option<DiagnosticsCallback>>,
}

/// Handle to a tracking agent. Clones share the same agent.
#[derive(Clone)]
pub struct ActivityTracker {
    inner: Arc<Inner>,
}

impl ActivityTracker {
    /// Create an inactive tracker. Nothing is dispatched until [`start`].
    ///
    /// [`start`]: ActivityTracker::start
    pub fn new(
        source: Arc<dyn InteractionSource>,
        sink: Arc<dyn ActivitySink>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                sink,
                config,
                state: Mutex::new(TrackerState {
                    session_id: generate_session_id(),
                    page_start: Instant::now(),
                    scroll_timer: None,
                }),
                active: AtomicBool::new(false),
                attached: AtomicBool::new(false),
                log: DispatchLog::new(),
                diagnostics: Mutex::new(None),
            }),
        }
    }

    /// Route dispatch failures to `callback` in addition to the log.
    pub fn set_diagnostics(&self, callback: DiagnosticsCallback) {
        *lock(&self.inner.diagnostics) = Some(callback);
    }

    /// Start tracking.
    ///
    /// Attaches to the interaction source on the first call and reports a
    /// page load for the current page. Calling it while already active does
    /// nothing; calling it after [`stop`] re-activates without attaching
    /// again.
    ///
    /// [`stop`]: ActivityTracker::stop
    pub fn start(&self) -> Result<(), TrackerError> {
        let runtime = Handle::try_current().map_err(|_| TrackerError::NoRuntime)?;

        if self.inner.active.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if !self.inner.attached.load(Ordering::SeqCst) {
            let events = match self.inner.source.attach() {
                Ok(events) => events,
                Err(e) => {
                    self.inner.active.store(false, Ordering::SeqCst);
                    return Err(e.into());
                }
            };
            self.inner.attached.store(true, Ordering::SeqCst);
            runtime.spawn(run_event_loop(self.clone(), events));
        }

        info!(session_id = %self.session_id(), "Activity tracking started");
        self.page_load();
        Ok(())
    }

    /// Stop tracking and report the time spent on the current page.
    ///
    /// Host events arriving afterwards are ignored and a pending scroll report
    /// is cancelled. The source stays attached.
    pub fn stop(&self) {
        if !self.inner.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(timer) = lock(&self.inner.state).scroll_timer.take() {
            timer.abort();
        }
        self.page_leave();
        info!("Activity tracking stopped");
    }

    /// Check if the tracker is currently active.
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Session identifier attached to records dispatched from now on.
    pub fn session_id(&self) -> String {
        lock(&self.inner.state).session_id.clone()
    }

    /// Replace the session identifier and return the new one.
    ///
    /// Records already dispatched keep the previous identifier.
    pub fn reset_session(&self) -> String {
        let session_id = generate_session_id();
        lock(&self.inner.state).session_id = session_id.clone();
        info!(%session_id, "Activity tracker session reinitialized");
        session_id
    }

    /// Get the dispatch statistics.
    pub fn stats(&self) -> DispatchStats {
        self.inner.log.stats()
    }

    /// Get a summary of dispatch statistics for display.
    pub fn summary(&self) -> String {
        self.inner.log.summary()
    }

    /// Report a search. `search_type` defaults to `general`.
    pub fn track_search(&self, query: &str, search_type: Option<&str>) {
        let search_type = search_type
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SEARCH_TYPE);

        self.dispatch(Activity::Search(SearchRecord {
            search_query: query.to_string(),
            search_type: search_type.to_string(),
        }));
    }

    /// Report a form interaction.
    pub fn track_form_activity(
        &self,
        form_id: i64,
        activity_type: &str,
        field_name: Option<&str>,
        content_length: usize,
    ) {
        self.dispatch(Activity::Form(FormActivity {
            form_id,
            activity_type: activity_type.to_string(),
            field_name: field_name.unwrap_or_default().to_string(),
            content_length,
        }));
    }

    fn handle_event(&self, event: HostEvent) {
        trace!(?event, "Host event");
        match event {
            HostEvent::Visibility { hidden: true } | HostEvent::Unload => self.page_leave(),
            HostEvent::Visibility { hidden: false } => self.page_load(),
            HostEvent::Navigate => {
                self.page_leave();
                self.schedule_after_navigation();
            }
            HostEvent::Click { target, x, y, button } => self.track_click(&target, x, y, button),
            HostEvent::Input { target } => self.track_form_input(&target),
            HostEvent::Scroll(metrics) => self.schedule_scroll(metrics),
        }
    }

    fn page_load(&self) {
        lock(&self.inner.state).page_start = Instant::now();
        let page = self.inner.source.current_page();

        self.dispatch(Activity::Browser(BrowserActivity {
            activity_type: BrowserActivityType::PageLoad,
            element_id: None,
            element_type: None,
            page_url: page.url.clone(),
            metadata: BrowserMetadata::PageLoad {
                referrer: page.referrer,
                user_agent: page.user_agent,
                screen_resolution: page.screen.to_string(),
                viewport: page.viewport.to_string(),
            },
        }));

        self.dispatch(Activity::Page(PageActivity {
            page_url: page.url,
            page_title: page.title,
            time_spent: 0,
        }));
    }

    fn page_leave(&self) {
        let time_spent = lock(&self.inner.state).page_start.elapsed().as_secs();
        let page = self.inner.source.current_page();

        self.dispatch(Activity::Page(PageActivity {
            page_url: page.url,
            page_title: page.title,
            time_spent,
        }));
    }

    fn track_click(&self, target: &ElementInfo, x: i32, y: i32, button: u16) {
        let page = self.inner.source.current_page();

        self.dispatch(Activity::Browser(BrowserActivity {
            activity_type: BrowserActivityType::Click,
            element_id: Some(identify(target, InteractionPath::Click)),
            element_type: Some(target.tag()),
            page_url: page.url,
            metadata: BrowserMetadata::Click { x, y, button },
        }));
    }

    fn track_form_input(&self, target: &ElementInfo) {
        if !target.is_form_field() {
            return;
        }
        let page = self.inner.source.current_page();

        self.dispatch(Activity::Browser(BrowserActivity {
            activity_type: BrowserActivityType::FormInput,
            element_id: Some(identify(target, InteractionPath::Input)),
            element_type: Some(target.tag()),
            page_url: page.url,
            metadata: BrowserMetadata::FormInput {
                field_name: target.name.clone().unwrap_or_default(),
                field_type: target.input_type.clone().unwrap_or_default(),
                value_length: target.value_length,
            },
        }));
    }

    fn track_scroll(&self, metrics: ScrollMetrics) {
        let page = self.inner.source.current_page();

        self.dispatch(Activity::Browser(BrowserActivity {
            activity_type: BrowserActivityType::Scroll,
            element_id: None,
            element_type: None,
            page_url: page.url,
            metadata: BrowserMetadata::Scroll {
                scroll_y: metrics.scroll_y,
                scroll_percentage: metrics.percentage(),
                viewport_height: metrics.viewport_height,
            },
        }));
    }

    /// Restart the single scroll timer; only the last scroll in a quiet
    /// window is reported.
    fn schedule_scroll(&self, metrics: ScrollMetrics) {
        let tracker = self.clone();
        let delay = self.inner.config.scroll_debounce;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tracker.is_active() {
                tracker.track_scroll(metrics);
            }
        });

        if let Some(previous) = lock(&self.inner.state).scroll_timer.replace(timer) {
            previous.abort();
        }
    }

    fn schedule_after_navigation(&self) {
        let tracker = self.clone();
        let delay = self.inner.config.navigation_settle;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tracker.is_active() {
                tracker.page_load();
            }
        });
    }

    /// Stamp `activity` with the current session and send it detached.
    fn dispatch(&self, activity: Activity) {
        let entry = LogEntry::new(self.session_id(), activity);
        let kind = entry.kind();

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(%kind, "No Tokio runtime, dropping activity record");
                return;
            }
        };

        let pending = self.inner.sink.send(entry);
        self.inner.log.record_dispatched(kind);

        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            if let Err(error) = pending.await {
                warn!(%kind, %error, "Failed to log activity");
                inner.log.record_failed();
                let callback = lock(&inner.diagnostics).clone();
                if let Some(callback) = callback {
                    callback(&DispatchFailure { kind, error });
                }
            }
        });
    }
}

async fn run_event_loop(tracker: ActivityTracker, mut events: UnboundedReceiver<HostEvent>) {
    while let Some(event) = events.recv().await {
        if !tracker.is_active() {
            trace!(?event, "Tracker inactive, ignoring host event");
            continue;
        }
        tracker.handle_event(event);
    }
    debug!("Interaction source closed");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
