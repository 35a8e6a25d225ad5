//! Interaction event types delivered by the host environment.
//!
//! These types carry only what the tracker needs to identify an element and
//! describe the interaction. Field values are never captured, only lengths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tags whose `input` events are tracked and whose `name` attribute can
/// identify them.
const FORM_FIELD_TAGS: [&str; 3] = ["input", "textarea", "select"];

/// The element an interaction targeted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Tag name as reported by the host (`BUTTON`, `input`, ...)
    pub tag_name: String,
    /// `id` attribute
    #[serde(default)]
    pub id: Option<String>,
    /// `data-testid` attribute
    #[serde(default, alias = "data-testid")]
    pub test_id: Option<String>,
    /// `name` attribute
    #[serde(default)]
    pub name: Option<String>,
    /// Raw `class` attribute (space separated)
    #[serde(default)]
    pub class_name: Option<String>,
    /// `type` attribute of form fields
    #[serde(default)]
    pub input_type: Option<String>,
    /// Length of the field's current value, in characters
    #[serde(default)]
    pub value_length: usize,
}

impl ElementInfo {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_test_id(mut self, test_id: impl Into<String>) -> Self {
        self.test_id = Some(test_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn with_value_length(mut self, value_length: usize) -> Self {
        self.value_length = value_length;
        self
    }

    /// Lower-cased tag name, `unknown` when the host sent none.
    pub fn tag(&self) -> String {
        if self.tag_name.trim().is_empty() {
            "unknown".to_string()
        } else {
            self.tag_name.to_lowercase()
        }
    }

    /// Whether this is an input, textarea or select element.
    pub fn is_form_field(&self) -> bool {
        FORM_FIELD_TAGS.contains(&self.tag().as_str())
    }
}

/// Width/height pair reported as `WxH`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What the host currently shows: location, title and display geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    /// Full page URL
    pub url: String,
    /// Document title
    #[serde(default)]
    pub title: String,
    /// Referrer, empty when unknown
    #[serde(default)]
    pub referrer: String,
    /// Host user agent string
    #[serde(default)]
    pub user_agent: String,
    /// Screen size
    #[serde(default)]
    pub screen: Dimensions,
    /// Viewport size
    #[serde(default)]
    pub viewport: Dimensions,
}

impl PageContext {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Scroll position at the time of a scroll event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    /// Vertical offset in pixels
    pub scroll_y: f64,
    /// Total scrollable document height
    pub scroll_height: f64,
    /// Viewport height
    pub viewport_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_y: f64, scroll_height: f64, viewport_height: f64) -> Self {
        Self {
            scroll_y,
            scroll_height,
            viewport_height,
        }
    }

    /// Rounded percentage of the scrollable range, 0 when nothing scrolls.
    pub fn percentage(&self) -> i64 {
        let max_scroll = self.scroll_height - self.viewport_height;
        if max_scroll > 0.0 {
            (self.scroll_y / max_scroll * 100.0).round() as i64
        } else {
            0
        }
    }
}

/// An interaction reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    /// Pointer click anywhere in the document
    Click {
        target: ElementInfo,
        #[serde(default)]
        x: i32,
        #[serde(default)]
        y: i32,
        #[serde(default)]
        button: u16,
    },
    /// Value change on any element
    Input { target: ElementInfo },
    /// Document scroll
    Scroll(ScrollMetrics),
    /// Page hidden or shown again
    Visibility { hidden: bool },
    /// Back/forward history navigation
    Navigate,
    /// Page about to unload
    Unload,
}

impl HostEvent {
    pub fn click(target: ElementInfo) -> Self {
        HostEvent::Click {
            target,
            x: 0,
            y: 0,
            button: 0,
        }
    }

    pub fn input(target: ElementInfo) -> Self {
        HostEvent::Input { target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_field_detection() {
        assert!(ElementInfo::new("INPUT").is_form_field());
        assert!(ElementInfo::new("textarea").is_form_field());
        assert!(ElementInfo::new("Select").is_form_field());
        assert!(!ElementInfo::new("DIV").is_form_field());
        assert!(!ElementInfo::new("").is_form_field());
    }

    #[test]
    fn test_scroll_percentage() {
        assert_eq!(ScrollMetrics::new(500.0, 2000.0, 1000.0).percentage(), 50);
        assert_eq!(ScrollMetrics::new(333.0, 2000.0, 1000.0).percentage(), 33);
        assert_eq!(ScrollMetrics::new(0.0, 800.0, 1000.0).percentage(), 0);
    }

    #[test]
    fn test_host_event_wire_format() {
        let json = r#"{"kind":"click","target":{"tag_name":"BUTTON","data-testid":"send"},"x":4}"#;
        let event: HostEvent = serde_json::from_str(json).unwrap();
        match event {
            HostEvent::Click { target, x, y, .. } => {
                assert_eq!(target.test_id.as_deref(), Some("send"));
                assert_eq!((x, y), (4, 0));
            }
            other => panic!("unexpected event {other:?}"),
        }

        let hidden: HostEvent = serde_json::from_str(r#"{"kind":"visibility","hidden":true}"#).unwrap();
        assert_eq!(hidden, HostEvent::Visibility { hidden: true });
    }
}
