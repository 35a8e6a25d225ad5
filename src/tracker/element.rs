//! Element identification for click and input records.
//!
//! Analytics group activity by `element_id`, so the precedence here must stay
//! stable: id, test id, name (form fields only), first class token (clicks
//! only), then the lower-cased tag name.

use crate::interaction::ElementInfo;

/// Upper bound on a dispatched `element_id`, in characters.
pub const MAX_ELEMENT_ID_LEN: usize = 500;

/// Which listener is identifying the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPath {
    Click,
    Input,
}

/// Resolve the identifier reported for `element`.
pub fn identify(element: &ElementInfo, path: InteractionPath) -> String {
    let form_field = element.is_form_field();

    let resolved = non_blank(&element.id)
        .or_else(|| non_blank(&element.test_id))
        .or_else(|| {
            if form_field {
                non_blank(&element.name)
            } else {
                None
            }
        })
        .or_else(|| match path {
            InteractionPath::Click => first_class(element),
            InteractionPath::Input => None,
        })
        .map(str::to_string)
        .unwrap_or_else(|| element.tag());

    truncate_id(&resolved)
}

/// Cut `id` down to [`MAX_ELEMENT_ID_LEN`] characters.
pub fn truncate_id(id: &str) -> String {
    match id.char_indices().nth(MAX_ELEMENT_ID_LEN) {
        Some((byte_index, _)) => id[..byte_index].to_string(),
        None => id.to_string(),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn first_class(element: &ElementInfo) -> Option<&str> {
    element.class_name.as_deref()?.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_beats_class() {
        let element = ElementInfo::new("DIV").with_id("foo").with_class("bar baz");
        assert_eq!(identify(&element, InteractionPath::Click), "foo");
    }

    #[test]
    fn test_click_precedence_chain() {
        let element = ElementInfo::new("BUTTON")
            .with_test_id("send")
            .with_class("btn primary");
        assert_eq!(identify(&element, InteractionPath::Click), "send");

        let element = ElementInfo::new("BUTTON").with_class("  btn primary");
        assert_eq!(identify(&element, InteractionPath::Click), "btn");

        let element = ElementInfo::new("BUTTON");
        assert_eq!(identify(&element, InteractionPath::Click), "button");
    }

    #[test]
    fn test_name_only_counts_for_form_fields() {
        let input = ElementInfo::new("INPUT").with_name("email").with_class("field");
        assert_eq!(identify(&input, InteractionPath::Click), "email");
        assert_eq!(identify(&input, InteractionPath::Input), "email");

        let button = ElementInfo::new("BUTTON").with_name("submit").with_class("cta");
        assert_eq!(identify(&button, InteractionPath::Click), "cta");
    }

    #[test]
    fn test_input_path_skips_class() {
        let textarea = ElementInfo::new("TEXTAREA").with_class("message-box");
        assert_eq!(identify(&textarea, InteractionPath::Input), "textarea");
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let element = ElementInfo::new("A").with_id("").with_test_id("  ").with_class("link");
        assert_eq!(identify(&element, InteractionPath::Click), "link");
    }

    #[test]
    fn test_long_ids_are_truncated() {
        for len in [501, 750, 5000] {
            let element = ElementInfo::new("DIV").with_id("x".repeat(len));
            assert_eq!(identify(&element, InteractionPath::Click).chars().count(), 500);
        }

        let exact = "y".repeat(500);
        assert_eq!(truncate_id(&exact), exact);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let id = "é".repeat(600);
        let truncated = truncate_id(&id);
        assert_eq!(truncated.chars().count(), 500);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
