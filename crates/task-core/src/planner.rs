//! Reply parsing and the planning fallback.
//!
//! The model is asked for exactly one JSON object, but real replies
//! arrive wrapped in markdown fences, prefixed with chatter, or
//! occasionally not at all. Anything that fails to yield a valid
//! action degrades to a short `wait` so the loop keeps moving; the
//! next turn's prompt then shows the model its own failure.

use pagepilot_action_exec::ActionRequest;
use tracing::warn;

use crate::llm::CompletionClient;
use crate::prompt::SYSTEM_PROMPT;

/// Pause taken when planning fails, in milliseconds.
const FALLBACK_WAIT_MS: u64 = 2000;

/// One planning call: completion plus reply parsing.
pub struct ActionPlanner {
    max_tokens: u32,
}

impl ActionPlanner {
    pub fn new(max_tokens: u32) -> Self {
        Self { max_tokens }
    }

    /// Ask the model for the next action. Never fails: planning
    /// trouble produces the fallback wait instead.
    pub async fn plan(&self, llm: &dyn CompletionClient, user_prompt: &str) -> ActionRequest {
        match llm.complete(SYSTEM_PROMPT, user_prompt, self.max_tokens).await {
            Ok(reply) => match parse_action_reply(&reply) {
                Ok(request) => request,
                Err(reason) => {
                    warn!(%reason, reply_chars = reply.len(), "unusable planner reply, waiting instead");
                    fallback_wait()
                }
            },
            Err(error) => {
                warn!(%error, "completion call failed, waiting instead");
                fallback_wait()
            }
        }
    }
}

fn fallback_wait() -> ActionRequest {
    ActionRequest::wait_ms(FALLBACK_WAIT_MS, "fallback")
}

/// Parse a model reply into an action request.
///
/// Accepts the object bare, inside a ```json fence, or embedded in
/// surrounding prose; requires `action` and a non-empty
/// `description`.
pub fn parse_action_reply(reply: &str) -> Result<ActionRequest, String> {
    let json_text = extract_json_object(reply).ok_or("no JSON object in reply")?;
    let request: ActionRequest =
        serde_json::from_str(&json_text).map_err(|e| format!("malformed action JSON: {e}"))?;
    if request.description.trim().is_empty() {
        return Err("action is missing a description".to_string());
    }
    Ok(request)
}

/// First balanced top-level JSON object in `text`, fences stripped.
fn extract_json_object(text: &str) -> Option<String> {
    let text = strip_fence(text);
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Cut the reply down to the inside of the first markdown fence, if
/// any. The fence language tag is ignored.
fn strip_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockCompletion;
    use pagepilot_action_exec::ActionKind;
    use serde_json::json;

    #[test]
    fn bare_object_parses() {
        let request = parse_action_reply(
            r##"{"action": "click", "selector": "#login", "description": "Press login"}"##,
        )
        .unwrap();
        assert_eq!(request.action, ActionKind::Click);
        assert_eq!(request.selector.as_ref().map(|s| s.as_str()), Some("#login"));
    }

    #[test]
    fn fenced_object_with_prose_parses() {
        let reply = "Here is the next step:\n```json\n{\"action\": \"extract\", \"description\": \"Read the page\"}\n```\nGood luck!";
        let request = parse_action_reply(reply).unwrap();
        assert_eq!(request.action, ActionKind::Extract);
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() {
        let reply = r#"{"action": "evaluate", "value": "JSON.stringify({a: 1})", "description": "Probe {page} state"}"#;
        let request = parse_action_reply(reply).unwrap();
        assert_eq!(request.value_text().unwrap(), "JSON.stringify({a: 1})");
    }

    #[test]
    fn unknown_action_and_missing_description_are_rejected() {
        assert!(parse_action_reply(r#"{"action": "fly", "description": "Up"}"#).is_err());
        assert!(parse_action_reply(r##"{"action": "click", "selector": "#a"}"##).is_err());
        assert!(parse_action_reply("the page looks fine to me").is_err());
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_wait() {
        let planner = ActionPlanner::new(256);
        let mock = MockCompletion::new();
        let request = planner.plan(&mock, "prompt").await;
        assert_eq!(request.action, ActionKind::Wait);
        assert_eq!(request.value_text().unwrap(), "2000ms");
    }

    #[tokio::test]
    async fn garbage_reply_degrades_to_wait() {
        let planner = ActionPlanner::new(256);
        let mock = MockCompletion::new().with_reply("I would click the button now");
        let request = planner.plan(&mock, "prompt").await;
        assert_eq!(request.action, ActionKind::Wait);
    }

    #[tokio::test]
    async fn valid_reply_passes_through() {
        let planner = ActionPlanner::new(256);
        let mock = MockCompletion::new().with_action(&json!({
            "action": "navigate",
            "target": "https://example.com",
            "description": "Open the site"
        }));
        let request = planner.plan(&mock, "prompt").await;
        assert_eq!(request.action, ActionKind::Navigate);
        assert_eq!(request.target.as_deref(), Some("https://example.com"));
    }
}
