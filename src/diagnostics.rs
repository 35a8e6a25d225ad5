//! Dispatch diagnostics for the activity tracker.
//!
//! Logging calls are fire-and-forget, so their outcome is only visible here:
//! per-kind counters of dispatched and failed records, plus an optional
//! callback that receives every failure.

use crate::api::ApiError;
use crate::tracker::records::ActivityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A logging call that did not reach the backend.
#[derive(Debug)]
pub struct DispatchFailure {
    pub kind: ActivityKind,
    pub error: ApiError,
}

/// Callback receiving dispatch failures.
pub type DiagnosticsCallback = Arc<dyn Fn(&DispatchFailure) + Send + Sync>;

/// Counters of records dispatched by the tracker.
#[derive(Debug)]
pub struct DispatchLog {
    browser_dispatched: AtomicU64,
    page_dispatched: AtomicU64,
    search_dispatched: AtomicU64,
    form_dispatched: AtomicU64,
    failed: AtomicU64,
    started_at: DateTime<Utc>,
}

impl DispatchLog {
    pub fn new() -> Self {
        Self {
            browser_dispatched: AtomicU64::new(0),
            page_dispatched: AtomicU64::new(0),
            search_dispatched: AtomicU64::new(0),
            form_dispatched: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    fn counter(&self, kind: ActivityKind) -> &AtomicU64 {
        match kind {
            ActivityKind::Browser => &self.browser_dispatched,
            ActivityKind::Page => &self.page_dispatched,
            ActivityKind::Search => &self.search_dispatched,
            ActivityKind::Form => &self.form_dispatched,
        }
    }

    /// Record a dispatched record.
    pub fn record_dispatched(&self, kind: ActivityKind) {
        self.counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed logging call.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            browser_dispatched: self.browser_dispatched.load(Ordering::Relaxed),
            page_dispatched: self.page_dispatched.load(Ordering::Relaxed),
            search_dispatched: self.search_dispatched.load(Ordering::Relaxed),
            form_dispatched: self.form_dispatched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Activity Tracking:\n\
             - Browser activities: {}\n\
             - Page activities: {}\n\
             - Searches: {}\n\
             - Form activities: {}\n\
             - Failed logging calls: {}\n\
             - Tracking for: {} seconds",
            stats.browser_dispatched,
            stats.page_dispatched,
            stats.search_dispatched,
            stats.form_dispatched,
            stats.failed,
            stats.uptime_secs
        )
    }
}

impl Default for DispatchLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of dispatch statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchStats {
    pub browser_dispatched: u64,
    pub page_dispatched: u64,
    pub search_dispatched: u64,
    pub form_dispatched: u64,
    pub failed: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

impl DispatchStats {
    pub fn total_dispatched(&self) -> u64 {
        self.browser_dispatched + self.page_dispatched + self.search_dispatched + self.form_dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_counting() {
        let log = DispatchLog::new();

        log.record_dispatched(ActivityKind::Browser);
        log.record_dispatched(ActivityKind::Browser);
        log.record_dispatched(ActivityKind::Search);
        log.record_failed();

        let stats = log.stats();
        assert_eq!(stats.browser_dispatched, 2);
        assert_eq!(stats.search_dispatched, 1);
        assert_eq!(stats.page_dispatched, 0);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_dispatched(), 3);
    }

    #[test]
    fn test_summary_format() {
        let log = DispatchLog::new();
        let summary = log.summary();

        assert!(summary.contains("Browser activities: 0"));
        assert!(summary.contains("Failed logging calls"));
    }
}
