//! User activity analytics dashboard.
//!
//! The backend aggregates everything; this module only selects the time
//! range, fetches the dataset and renders it as text.

use crate::api::{ApiClient, ACTIVITY_ANALYTICS_PATH};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Period the analytics are aggregated over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    #[default]
    All,
    PastDay,
    PastWeek,
    PastMonth,
    PastSixMonths,
    PastYear,
}

impl TimeRange {
    pub const ALL: [TimeRange; 6] = [
        TimeRange::All,
        TimeRange::PastDay,
        TimeRange::PastWeek,
        TimeRange::PastMonth,
        TimeRange::PastSixMonths,
        TimeRange::PastYear,
    ];

    /// Value sent as the `time_range` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::All => "all",
            TimeRange::PastDay => "past day",
            TimeRange::PastWeek => "past week",
            TimeRange::PastMonth => "past month",
            TimeRange::PastSixMonths => "past 6 months",
            TimeRange::PastYear => "past year",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            TimeRange::All => "All Time",
            TimeRange::PastDay => "Past Day",
            TimeRange::PastWeek => "Past Week",
            TimeRange::PastMonth => "Past Month",
            TimeRange::PastSixMonths => "Past 6 Months",
            TimeRange::PastYear => "Past Year",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        TimeRange::ALL
            .into_iter()
            .find(|range| range.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown time range '{s}', expected one of: {}",
                    TimeRange::ALL.map(TimeRange::as_str).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchTypeCount {
    pub search_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentSearch {
    pub search_query: String,
    pub search_type: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchAnalytics {
    pub total_searches: u64,
    pub search_types: Vec<SearchTypeCount>,
    pub recent_searches: Vec<RecentSearch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitedPage {
    pub page_title: String,
    pub page_url: String,
    pub visit_count: u64,
    pub time_spent: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageAnalytics {
    pub total_pages_visited: u64,
    pub total_time_spent: u64,
    pub most_visited_pages: Vec<VisitedPage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityTypeCount {
    pub activity_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentFormActivity {
    pub activity_type: String,
    pub field_name: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormAnalytics {
    pub total_form_activities: u64,
    pub activity_types: Vec<ActivityTypeCount>,
    pub total_content_length: u64,
    pub recent_form_activities: Vec<RecentFormActivity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentBrowserActivity {
    pub activity_type: String,
    pub page_url: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserAnalytics {
    pub total_activities: u64,
    pub activity_types: Vec<ActivityTypeCount>,
    pub recent_activities: Vec<RecentBrowserActivity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyActivity {
    pub date: String,
    pub searches: u64,
    pub pages: u64,
    pub forms: u64,
}

/// Aggregated activity of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityAnalytics {
    pub search_analytics: SearchAnalytics,
    pub page_analytics: PageAnalytics,
    pub form_analytics: FormAnalytics,
    pub browser_analytics: BrowserAnalytics,
    pub daily_activity: Vec<DailyActivity>,
}

impl ActivityAnalytics {
    /// Fully populated dataset with every count zero and every list empty.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// State of the analytics dashboard.
pub struct ActivityDashboard {
    api: ApiClient,
    time_range: TimeRange,
    data: Option<ActivityAnalytics>,
    loading: bool,
}

impl ActivityDashboard {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            time_range: TimeRange::default(),
            data: None,
            loading: false,
        }
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn data(&self) -> Option<&ActivityAnalytics> {
        self.data.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Select a new range and refetch.
    pub async fn set_time_range(&mut self, range: TimeRange) {
        self.time_range = range;
        self.fetch().await;
    }

    /// Fetch analytics for the selected range.
    ///
    /// Without a stored token the zeroed dataset is shown and no request is
    /// made. A failed request keeps whatever was shown before.
    pub async fn fetch(&mut self) {
        self.loading = true;

        if !self.api.has_token() {
            tracing::warn!("User not logged in, showing empty activity analytics");
            self.data = Some(ActivityAnalytics::empty());
            self.loading = false;
            return;
        }

        tracing::debug!(time_range = %self.time_range, "Fetching activity analytics");
        match self
            .api
            .get_json::<ActivityAnalytics>(
                ACTIVITY_ANALYTICS_PATH,
                &[("time_range", self.time_range.as_str())],
                true,
            )
            .await
        {
            Ok(data) => self.data = Some(data),
            Err(e) => tracing::error!("Error fetching activity data: {e}"),
        }

        self.loading = false;
    }

    /// Render the dashboard as plain text.
    pub fn render(&self) -> String {
        if self.loading {
            return "Loading your activity data...".to_string();
        }
        match &self.data {
            Some(data) => render_analytics(data, self.time_range),
            None => "Failed to load activity data. Please try again.".to_string(),
        }
    }
}

/// Format a duration in seconds as `"{h}h {m}m"` or `"{m}m"`.
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Format an RFC 3339 timestamp, naive ISO datetime or `YYYY-MM-DD` date as
/// `"May 1, 2024"`. Anything else is returned unchanged.
pub fn format_date(value: &str) -> String {
    let date = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
        })
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => value.to_string(),
    }
}

fn render_analytics(data: &ActivityAnalytics, range: TimeRange) -> String {
    let mut out = String::new();
    let search = &data.search_analytics;
    let pages = &data.page_analytics;
    let forms = &data.form_analytics;
    let browser = &data.browser_analytics;

    let _ = writeln!(out, "User Activity Dashboard ({})", range.label());
    let _ = writeln!(out);

    let _ = writeln!(out, "Search Activity: {} total searches", search.total_searches);
    for t in &search.search_types {
        let _ = writeln!(out, "  - {}: {}", t.search_type, t.count);
    }
    for s in &search.recent_searches {
        let _ = writeln!(
            out,
            "  \"{}\" ({}) on {}",
            s.search_query,
            s.search_type,
            format_date(&s.timestamp)
        );
    }

    let _ = writeln!(
        out,
        "Page Activity: {} pages visited, {} spent",
        pages.total_pages_visited,
        format_time(pages.total_time_spent)
    );
    for p in &pages.most_visited_pages {
        let _ = writeln!(
            out,
            "  - {} ({}): {} visits, {}",
            p.page_title,
            p.page_url,
            p.visit_count,
            format_time(p.time_spent)
        );
    }

    let _ = writeln!(
        out,
        "Form Activity: {} activities, {} characters",
        forms.total_form_activities, forms.total_content_length
    );
    for t in &forms.activity_types {
        let _ = writeln!(out, "  - {}: {}", t.activity_type, t.count);
    }

    let _ = writeln!(out, "Browser Activity: {} total", browser.total_activities);
    for t in &browser.activity_types {
        let _ = writeln!(out, "  - {}: {}", t.activity_type, t.count);
    }

    if !data.daily_activity.is_empty() {
        let _ = writeln!(out, "Daily Activity:");
        for day in &data.daily_activity {
            let _ = writeln!(
                out,
                "  {}: {} searches, {} pages, {} forms",
                format_date(&day.date),
                day.searches,
                day.pages,
                day.forms
            );
        }
    }

    out
}
