use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::errors::ActionError;

/// Default timeout for the polling wait actions.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Ceiling applied to model-chosen pure delays.
pub const MAX_PLAIN_WAIT_MS: u64 = 60_000;

/// Opaque element locator.
///
/// Produced by the sensing script, consumed verbatim by the page scripts.
/// Agent code never inspects or rewrites the inside.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(String);

impl Selector {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// The closed action vocabulary. Wire names are snake_case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Click,
    Type,
    SelectDropdown,
    Check,
    Uncheck,
    Clear,
    Focus,
    Blur,
    Hover,
    Keypress,
    DoubleClick,
    RightClick,
    Scroll,
    Wait,
    WaitForElement,
    WaitForDynamicContent,
    Extract,
    Evaluate,
    Complete,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Click => "click",
            Self::Type => "type",
            Self::SelectDropdown => "select_dropdown",
            Self::Check => "check",
            Self::Uncheck => "uncheck",
            Self::Clear => "clear",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Hover => "hover",
            Self::Keypress => "keypress",
            Self::DoubleClick => "double_click",
            Self::RightClick => "right_click",
            Self::Scroll => "scroll",
            Self::Wait => "wait",
            Self::WaitForElement => "wait_for_element",
            Self::WaitForDynamicContent => "wait_for_dynamic_content",
            Self::Extract => "extract",
            Self::Evaluate => "evaluate",
            Self::Complete => "complete",
        }
    }

    /// Actions that manipulate elements, for recent-context heuristics.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            Self::Click
                | Self::Type
                | Self::SelectDropdown
                | Self::Clear
                | Self::Focus
                | Self::Hover
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional per-action tuning knobs, camelCase on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_after: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

/// The action object exchanged with the language model, verbatim.
///
/// `action` and `description` are mandatory; everything else depends on the
/// action kind and is validated by [`ActionRequest::classify`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ActionOptions>,
}

impl ActionRequest {
    pub fn new(action: ActionKind, description: impl Into<String>) -> Self {
        Self {
            action,
            selector: None,
            value: None,
            target: None,
            description: description.into(),
            reasoning: None,
            result: None,
            options: None,
        }
    }

    pub fn navigate(target: impl Into<String>, description: impl Into<String>) -> Self {
        let mut request = Self::new(ActionKind::Navigate, description);
        request.target = Some(target.into());
        request
    }

    pub fn wait_ms(ms: u64, description: impl Into<String>) -> Self {
        let mut request = Self::new(ActionKind::Wait, description);
        request.value = Some(Value::String(format!("{}ms", ms)));
        request
    }

    pub fn with_selector(mut self, selector: impl Into<Selector>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_options(mut self, options: ActionOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// `value` rendered as plain text, for the actions that take one.
    pub fn value_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The key a keypress request names, wherever it was put.
    pub fn keypress_key(&self) -> Option<String> {
        if self.action != ActionKind::Keypress {
            return None;
        }
        self.options
            .as_ref()
            .and_then(|o| o.key.clone())
            .or_else(|| self.value_text())
    }

    fn require_selector(&self) -> Result<Selector, ActionError> {
        self.selector
            .clone()
            .ok_or_else(|| ActionError::invalid(format!("{} requires a selector", self.action)))
    }

    /// Convert the loose wire form into a typed action, validating that the
    /// fields present form a legal instance of the kind.
    pub fn classify(&self) -> Result<PlannedAction, ActionError> {
        let planned = match self.action {
            ActionKind::Navigate => {
                let url = self
                    .target
                    .clone()
                    .or_else(|| self.value_text())
                    .ok_or_else(|| ActionError::invalid("navigate requires a target URL"))?;
                PlannedAction::Navigate { url }
            }
            ActionKind::Click => PlannedAction::Click {
                selector: self.require_selector()?,
            },
            ActionKind::Type => PlannedAction::Type {
                selector: self.require_selector()?,
                text: self
                    .value_text()
                    .ok_or_else(|| ActionError::invalid("type requires a text value"))?,
            },
            ActionKind::SelectDropdown => PlannedAction::SelectDropdown {
                selector: self.require_selector()?,
                option: self
                    .value_text()
                    .ok_or_else(|| ActionError::invalid("select_dropdown requires an option"))?,
            },
            ActionKind::Check => PlannedAction::SetChecked {
                selector: self.require_selector()?,
                desired: true,
            },
            ActionKind::Uncheck => PlannedAction::SetChecked {
                selector: self.require_selector()?,
                desired: false,
            },
            ActionKind::Clear => PlannedAction::Clear {
                selector: self.require_selector()?,
            },
            ActionKind::Focus => PlannedAction::Focus {
                selector: self.require_selector()?,
            },
            ActionKind::Blur => PlannedAction::Blur {
                selector: self.require_selector()?,
            },
            ActionKind::Hover => PlannedAction::Hover {
                selector: self.require_selector()?,
            },
            ActionKind::Keypress => PlannedAction::Keypress {
                selector: self.selector.clone(),
                key: self
                    .keypress_key()
                    .ok_or_else(|| ActionError::invalid("keypress requires a key"))?,
            },
            ActionKind::DoubleClick => PlannedAction::DoubleClick {
                selector: self.require_selector()?,
            },
            ActionKind::RightClick => PlannedAction::RightClick {
                selector: self.require_selector()?,
            },
            ActionKind::Scroll => PlannedAction::Scroll {
                target: match self.selector.clone() {
                    Some(selector) => ScrollTarget::Element(selector),
                    None => {
                        let direction = self
                            .value_text()
                            .or_else(|| self.target.clone())
                            .map(|d| ScrollDirection::parse(&d))
                            .unwrap_or(ScrollDirection::Down);
                        ScrollTarget::Viewport(direction)
                    }
                },
            },
            ActionKind::Wait => PlannedAction::Wait {
                ms: self.parse_wait_ms(),
            },
            ActionKind::WaitForElement => PlannedAction::WaitForElement {
                selector: self.require_selector()?,
                timeout_ms: self.timeout_ms(),
            },
            ActionKind::WaitForDynamicContent => PlannedAction::WaitForDynamicContent {
                timeout_ms: self.timeout_ms(),
            },
            ActionKind::Extract => PlannedAction::Extract,
            ActionKind::Evaluate => PlannedAction::Evaluate {
                script: self
                    .value_text()
                    .ok_or_else(|| ActionError::invalid("evaluate requires a script"))?,
            },
            ActionKind::Complete => PlannedAction::Complete {
                result: self.result.clone(),
            },
        };
        Ok(planned)
    }

    fn timeout_ms(&self) -> u64 {
        self.options
            .as_ref()
            .and_then(|o| o.timeout)
            .unwrap_or(DEFAULT_WAIT_TIMEOUT_MS)
    }

    fn parse_wait_ms(&self) -> u64 {
        let parsed = match self.value.as_ref() {
            None => Some(1_000),
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => {
                let trimmed = s.trim().trim_end_matches("ms").trim();
                trimmed.parse::<u64>().ok()
            }
            Some(_) => None,
        };
        let ms = match parsed {
            Some(ms) => ms,
            None => {
                warn!(value = ?self.value, "unparseable wait value, using 1000ms");
                1_000
            }
        };
        ms.min(MAX_PLAIN_WAIT_MS)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Self::Up,
            "left" => Self::Left,
            "right" => Self::Right,
            "down" => Self::Down,
            other => {
                warn!(direction = other, "unknown scroll direction, using down");
                Self::Down
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScrollTarget {
    Element(Selector),
    Viewport(ScrollDirection),
}

/// Typed form of an [`ActionRequest`]; each variant carries exactly the
/// fields its kind needs.
#[derive(Clone, Debug, PartialEq)]
pub enum PlannedAction {
    Navigate { url: String },
    Click { selector: Selector },
    Type { selector: Selector, text: String },
    SelectDropdown { selector: Selector, option: String },
    SetChecked { selector: Selector, desired: bool },
    Clear { selector: Selector },
    Focus { selector: Selector },
    Blur { selector: Selector },
    Hover { selector: Selector },
    Keypress { selector: Option<Selector>, key: String },
    DoubleClick { selector: Selector },
    RightClick { selector: Selector },
    Scroll { target: ScrollTarget },
    Wait { ms: u64 },
    WaitForElement { selector: Selector, timeout_ms: u64 },
    WaitForDynamicContent { timeout_ms: u64 },
    Extract,
    Evaluate { script: String },
    Complete { result: Option<Value> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_are_stable() {
        let request = ActionRequest::new(ActionKind::SelectDropdown, "Pick shipping speed")
            .with_selector("#speed")
            .with_value(json!("Express"))
            .with_options(ActionOptions {
                wait_after: Some(true),
                click_count: Some(1),
                ..ActionOptions::default()
            });
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["action"], "select_dropdown");
        assert_eq!(wire["selector"], "#speed");
        assert_eq!(wire["options"]["waitAfter"], true);
        assert_eq!(wire["options"]["clickCount"], 1);
        assert!(wire.get("reasoning").is_none());
    }

    #[test]
    fn wire_object_parses_back() {
        let wire = json!({
            "action": "wait_for_dynamic_content",
            "description": "Let results render",
            "reasoning": "The page is still loading",
            "options": {"timeout": 4000}
        });
        let request: ActionRequest = serde_json::from_value(wire).unwrap();
        assert_eq!(request.action, ActionKind::WaitForDynamicContent);
        match request.classify().unwrap() {
            PlannedAction::WaitForDynamicContent { timeout_ms } => assert_eq!(timeout_ms, 4000),
            other => panic!("expected wait_for_dynamic_content, got {:?}", other),
        }
    }

    #[test]
    fn unknown_action_is_rejected_at_parse() {
        let wire = json!({"action": "teleport", "description": "nope"});
        assert!(serde_json::from_value::<ActionRequest>(wire).is_err());
    }

    #[test]
    fn click_without_selector_fails_classification() {
        let request = ActionRequest::new(ActionKind::Click, "Click something");
        match request.classify() {
            Err(ActionError::Invalid(reason)) => assert!(reason.contains("selector")),
            other => panic!("expected invalid, got {:?}", other),
        }
    }

    #[test]
    fn navigate_takes_target_or_value() {
        let by_target = ActionRequest::navigate("https://example.com", "Go");
        assert!(matches!(
            by_target.classify().unwrap(),
            PlannedAction::Navigate { url } if url == "https://example.com"
        ));

        let by_value =
            ActionRequest::new(ActionKind::Navigate, "Go").with_value(json!("example.com"));
        assert!(matches!(
            by_value.classify().unwrap(),
            PlannedAction::Navigate { url } if url == "example.com"
        ));
    }

    #[test]
    fn wait_value_forms_parse() {
        let cases = [
            (json!(2500), 2500),
            (json!("2500"), 2500),
            (json!("2500ms"), 2500),
            (json!({"weird": true}), 1000),
        ];
        for (value, expected) in cases {
            let request = ActionRequest::new(ActionKind::Wait, "pause").with_value(value);
            match request.classify().unwrap() {
                PlannedAction::Wait { ms } => assert_eq!(ms, expected),
                other => panic!("expected wait, got {:?}", other),
            }
        }
        let absent = ActionRequest::new(ActionKind::Wait, "pause");
        assert!(matches!(
            absent.classify().unwrap(),
            PlannedAction::Wait { ms: 1000 }
        ));
    }

    #[test]
    fn excessive_wait_is_clamped() {
        let request = ActionRequest::new(ActionKind::Wait, "pause").with_value(json!(10_000_000));
        match request.classify().unwrap() {
            PlannedAction::Wait { ms } => assert_eq!(ms, MAX_PLAIN_WAIT_MS),
            other => panic!("expected wait, got {:?}", other),
        }
    }

    #[test]
    fn keypress_key_prefers_options() {
        let request = ActionRequest::new(ActionKind::Keypress, "press")
            .with_value(json!("Tab"))
            .with_options(ActionOptions {
                key: Some("Enter".into()),
                ..ActionOptions::default()
            });
        assert_eq!(request.keypress_key().as_deref(), Some("Enter"));

        let value_only = ActionRequest::new(ActionKind::Keypress, "press").with_value(json!("Enter"));
        assert_eq!(value_only.keypress_key().as_deref(), Some("Enter"));
    }

    #[test]
    fn scroll_direction_defaults_down() {
        let request = ActionRequest::new(ActionKind::Scroll, "scroll");
        assert!(matches!(
            request.classify().unwrap(),
            PlannedAction::Scroll {
                target: ScrollTarget::Viewport(ScrollDirection::Down)
            }
        ));

        let up = ActionRequest::new(ActionKind::Scroll, "scroll").with_value(json!("Up"));
        assert!(matches!(
            up.classify().unwrap(),
            PlannedAction::Scroll {
                target: ScrollTarget::Viewport(ScrollDirection::Up)
            }
        ));
    }

    #[test]
    fn complete_carries_result_payload() {
        let request = ActionRequest::new(ActionKind::Complete, "Done")
            .with_result(json!({"found": "laptop", "price": "$999"}));
        match request.classify().unwrap() {
            PlannedAction::Complete { result: Some(result) } => {
                assert_eq!(result["price"], "$999");
            }
            other => panic!("expected complete with payload, got {:?}", other),
        }
    }
}
