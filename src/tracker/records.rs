//! Activity records posted to the logging endpoints.

use crate::api::{
    LOG_BROWSER_ACTIVITY_PATH, LOG_FORM_ACTIVITY_PATH, LOG_PAGE_ACTIVITY_PATH, LOG_SEARCH_PATH,
};
use serde::Serialize;
use std::fmt;

/// Generic browser activity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserActivityType {
    PageLoad,
    Click,
    FormInput,
    Scroll,
}

/// Metadata attached to a browser activity record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BrowserMetadata {
    PageLoad {
        referrer: String,
        user_agent: String,
        screen_resolution: String,
        viewport: String,
    },
    Click {
        x: i32,
        y: i32,
        button: u16,
    },
    FormInput {
        field_name: String,
        field_type: String,
        value_length: usize,
    },
    Scroll {
        scroll_y: f64,
        scroll_percentage: i64,
        viewport_height: f64,
    },
}

/// Page load, click, scroll or form-field touch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowserActivity {
    pub activity_type: BrowserActivityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    pub page_url: String,
    pub metadata: BrowserMetadata,
}

/// Page visit with its dwell time in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageActivity {
    pub page_url: String,
    pub page_title: String,
    pub time_spent: u64,
}

/// Explicit search reported by UI code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRecord {
    pub search_query: String,
    pub search_type: String,
}

/// Explicit form interaction reported by UI code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormActivity {
    pub form_id: i64,
    pub activity_type: String,
    pub field_name: String,
    pub content_length: usize,
}

/// Any record the tracker dispatches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Activity {
    Browser(BrowserActivity),
    Page(PageActivity),
    Search(SearchRecord),
    Form(FormActivity),
}

impl Activity {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Activity::Browser(_) => ActivityKind::Browser,
            Activity::Page(_) => ActivityKind::Page,
            Activity::Search(_) => ActivityKind::Search,
            Activity::Form(_) => ActivityKind::Form,
        }
    }

    /// Logging endpoint this record is posted to.
    pub fn endpoint(&self) -> &'static str {
        self.kind().endpoint()
    }
}

/// Record family, one per logging endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Browser,
    Page,
    Search,
    Form,
}

impl ActivityKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            ActivityKind::Browser => LOG_BROWSER_ACTIVITY_PATH,
            ActivityKind::Page => LOG_PAGE_ACTIVITY_PATH,
            ActivityKind::Search => LOG_SEARCH_PATH,
            ActivityKind::Form => LOG_FORM_ACTIVITY_PATH,
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivityKind::Browser => "browser",
            ActivityKind::Page => "page",
            ActivityKind::Search => "search",
            ActivityKind::Form => "form",
        };
        f.write_str(name)
    }
}

/// A record stamped with the session it was dispatched under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    #[serde(flatten)]
    pub activity: Activity,
    pub session_id: String,
}

impl LogEntry {
    pub fn new(session_id: impl Into<String>, activity: Activity) -> Self {
        Self {
            activity,
            session_id: session_id.into(),
        }
    }

    pub fn kind(&self) -> ActivityKind {
        self.activity.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_click_entry_body() {
        let entry = LogEntry::new(
            "session_1_abc",
            Activity::Browser(BrowserActivity {
                activity_type: BrowserActivityType::Click,
                element_id: Some("send-button".to_string()),
                element_type: Some("button".to_string()),
                page_url: "http://localhost/chat".to_string(),
                metadata: BrowserMetadata::Click { x: 10, y: 20, button: 0 },
            }),
        );

        let body = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            body,
            json!({
                "activity_type": "click",
                "element_id": "send-button",
                "element_type": "button",
                "page_url": "http://localhost/chat",
                "metadata": {"x": 10, "y": 20, "button": 0},
                "session_id": "session_1_abc",
            })
        );
        assert_eq!(entry.activity.endpoint(), LOG_BROWSER_ACTIVITY_PATH);
    }

    #[test]
    fn test_scroll_entry_omits_element() {
        let entry = LogEntry::new(
            "s",
            Activity::Browser(BrowserActivity {
                activity_type: BrowserActivityType::Scroll,
                element_id: None,
                element_type: None,
                page_url: "http://localhost/".to_string(),
                metadata: BrowserMetadata::Scroll {
                    scroll_y: 120.0,
                    scroll_percentage: 12,
                    viewport_height: 900.0,
                },
            }),
        );

        let body = serde_json::to_value(&entry).unwrap();
        assert!(body.get("element_id").is_none());
        assert_eq!(body["metadata"]["scroll_percentage"], 12);
    }

    #[test]
    fn test_search_entry_body() {
        let entry = LogEntry::new(
            "s",
            Activity::Search(SearchRecord {
                search_query: "climate action".to_string(),
                search_type: "chatbot".to_string(),
            }),
        );

        let body = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            body,
            json!({"search_query": "climate action", "search_type": "chatbot", "session_id": "s"})
        );
        assert_eq!(entry.kind().endpoint(), LOG_SEARCH_PATH);
    }
}
