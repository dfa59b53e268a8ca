use serde::{Deserialize, Serialize};

/// Bounding box of an element, in CSS pixels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One interactive element as reported by the in-page collection script.
///
/// Field names mirror the script's JSON output (camelCase); `selector` is an
/// opaque locator that is only ever handed back to the page for
/// re-resolution, never parsed by agent code.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementInfo {
    pub tag: String,
    pub selector: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    pub href: Option<String>,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub name: Option<String>,
    pub aria_label: Option<String>,
    pub role: Option<String>,
    pub data_test_id: Option<String>,
    pub checked: Option<bool>,
    pub selected: Option<bool>,
    pub disabled: bool,
    pub readonly: bool,
    pub options: Vec<String>,
    pub visible: bool,
    pub clickable: bool,
    pub position: Option<ElementBox>,
    pub in_viewport: bool,
    pub is_date_input: bool,
    pub is_search_input: bool,
    pub has_dropdown: bool,
}

impl ElementInfo {
    /// Short human-readable label used in prompt listings.
    pub fn label(&self) -> &str {
        if !self.text.is_empty() {
            return &self.text;
        }
        if let Some(label) = self.aria_label.as_deref() {
            if !label.is_empty() {
                return label;
            }
        }
        if let Some(placeholder) = self.placeholder.as_deref() {
            if !placeholder.is_empty() {
                return placeholder;
            }
        }
        ""
    }
}

/// Price and time strings detected in the visible text, deduplicated in
/// first-seen order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DetectedPatterns {
    pub prices: Vec<String>,
    pub times: Vec<String>,
}

impl DetectedPatterns {
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty() && self.times.is_empty()
    }
}

/// Bounded snapshot of the current page. Recomputed every loop iteration,
/// never persisted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageState {
    pub url: String,
    pub title: String,
    pub elements: Vec<ElementInfo>,
    pub visible_text: String,
    pub raw_html: String,
    pub patterns: DetectedPatterns,
    pub has_content: bool,
}

/// Raw payload returned by the collection script, before budgets apply.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct SnapshotPayload {
    pub url: String,
    pub title: String,
    pub elements: Vec<ElementInfo>,
    pub visible_text: String,
    pub raw_html: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn element_parses_from_script_shape() {
        let value = json!({
            "tag": "input",
            "selector": "#q",
            "text": "",
            "type": "search",
            "placeholder": "Search products",
            "isSearchInput": true,
            "inViewport": true,
            "visible": true,
            "clickable": false,
            "position": {"x": 1.0, "y": 2.0, "width": 100.0, "height": 20.0}
        });
        let element: ElementInfo = serde_json::from_value(value).unwrap();
        assert_eq!(element.kind.as_deref(), Some("search"));
        assert!(element.is_search_input);
        assert_eq!(element.label(), "Search products");
    }

    #[test]
    fn missing_fields_default() {
        let element: ElementInfo =
            serde_json::from_value(json!({"tag": "a", "selector": "a:nth-of-type(1)"})).unwrap();
        assert!(!element.clickable);
        assert!(element.options.is_empty());
        assert!(element.position.is_none());
    }
}
