//! Prompt composition.
//!
//! The strategy rules, the action vocabulary and the reply schema
//! never change, so they live in [`SYSTEM_PROMPT`] and are sent as
//! the system message on every call. The user message carries only
//! live state: instruction, page, plan progress, recent steps, and
//! the two conditional sections chosen by the [`ContextPolicy`].

use std::sync::Arc;

use pagepilot_page_sense::text::estimate_tokens;
use pagepilot_page_sense::{ElementInfo, PageState};
use tracing::debug;

use crate::context::{ContextPolicy, KeywordContextPolicy};
use crate::model::Step;
use crate::todo::TodoOutline;

/// How many trailing steps the model sees each turn.
const RECENT_STEP_WINDOW: usize = 3;

/// Fixed system message: strategy, vocabulary, reply schema.
pub const SYSTEM_PROMPT: &str = r#"You are a browser automation agent. You drive a live web page one atomic action at a time. Each turn you receive the task, the current page state and your recent steps; you reply with exactly one JSON object describing the next action. No prose, no markdown fences, no multiple actions.

Reply schema (one JSON object):
{
  "action": "<one of the actions below>",
  "selector": "<CSS selector, for actions that target an element>",
  "value": "<text, URL, milliseconds, direction or script, depending on the action>",
  "target": "<URL, for navigate>",
  "description": "<short summary of this step>",
  "reasoning": "<optional: why this step>",
  "result": <only with "complete": the final answer payload>,
  "options": {"timeout": <ms>, "waitAfter": <bool>, "key": "<key name>", "delay": <ms>}
}
"action" and "description" are required. Use exactly these field names.

Actions:
- navigate: open a URL. Put the URL in "target" (or "value").
- click: click the element at "selector".
- type: replace the contents of the field at "selector" with "value". Search boxes are submitted automatically afterwards.
- select_dropdown: pick the option matching "value" (visible text or value attribute) in the dropdown at "selector".
- check / uncheck: set a checkbox or radio at "selector". An already-correct state is left untouched.
- clear: empty the field at "selector".
- focus / blur / hover: the corresponding focus or pointer operation on "selector".
- keypress: press options.key (or "value") on the element at "selector", or on the page when no selector is given.
- double_click / right_click: the corresponding click variant on "selector".
- scroll: bring the element at "selector" into view, or scroll the viewport in direction "value" ("up" or "down").
- wait: pause for "value" milliseconds, e.g. "2000" or "2000ms".
- wait_for_element: wait until the selector in "value" is visible; options.timeout in ms.
- wait_for_dynamic_content: wait until the page stops loading and real content is present; options.timeout in ms.
- extract: capture a structured snapshot of the page (headings, links, lists, tables, forms, prices, times).
- evaluate: run the JavaScript in "value" and return its value.
- complete: the task is finished. Put the final answer in "result".

Strategy:
- For a known site (retailer, airline, job board), navigate directly to its domain instead of searching for it.
- When the right site is unknown, navigate to a search engine, run one query, then follow the best result.
- Use selectors from the element listing verbatim; prefer #id selectors when offered. Never invent selectors that are not on the page.
- Type whole values in a single step; the page receives proper input events.
- After a navigation or a submitted search, look at the fresh page state before acting again.
- If an element you need is missing, scroll or wait_for_dynamic_content before concluding it does not exist.
- If the same approach has failed twice, change strategy instead of repeating it.
- When the task asks for information, extract before completing, and put everything asked for into "result"."#;

/// Builds the per-turn user message.
pub struct PromptComposer {
    policy: Arc<dyn ContextPolicy>,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self {
            policy: Arc::new(KeywordContextPolicy::default()),
        }
    }
}

impl PromptComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: Arc<dyn ContextPolicy>) -> Self {
        Self { policy }
    }

    pub fn compose(&self, instruction: &str, state: &PageState, steps: &[Step]) -> String {
        let completed = steps.iter().filter(|s| s.is_completed()).count();
        let include_elements = self.policy.include_elements(instruction, steps);
        let include_text = self.policy.include_page_text(instruction, steps);

        let mut prompt = String::new();
        prompt.push_str("## Task\n");
        prompt.push_str(instruction);
        prompt.push_str("\n\n## Current Page\n");
        prompt.push_str(&format!("URL: {}\nTitle: {}\n", state.url, state.title));

        let outline = TodoOutline::for_instruction(instruction);
        prompt.push_str("\n## Plan\n");
        prompt.push_str(&outline.render(completed));
        prompt.push('\n');

        prompt.push_str("\n## Recent Steps\n");
        if steps.is_empty() {
            prompt.push_str("No steps taken yet.\n");
        } else {
            let start = steps.len().saturating_sub(RECENT_STEP_WINDOW);
            for (offset, step) in steps[start..].iter().enumerate() {
                prompt.push_str(&describe_step(start + offset + 1, step));
                prompt.push('\n');
            }
        }

        if include_elements {
            if state.elements.is_empty() {
                prompt.push_str("\n## Interactive Elements\n");
                prompt.push_str("0 interactive elements found on this page.\n");
            } else {
                prompt.push_str(&format!(
                    "\n## Interactive Elements ({} shown)\n",
                    state.elements.len()
                ));
                for (index, element) in state.elements.iter().enumerate() {
                    prompt.push_str(&describe_element(index + 1, element));
                    prompt.push('\n');
                }
            }
        }

        if include_text {
            prompt.push_str("\n## Page Text\n");
            if state.has_content {
                prompt.push_str(&state.visible_text);
                prompt.push('\n');
            } else {
                prompt.push_str("The page has no significant text content yet.\n");
            }
            if !state.patterns.prices.is_empty() {
                prompt.push_str(&format!(
                    "Detected prices: {}\n",
                    state.patterns.prices.join(", ")
                ));
            }
            if !state.patterns.times.is_empty() {
                prompt.push_str(&format!(
                    "Detected times: {}\n",
                    state.patterns.times.join(", ")
                ));
            }
        }

        debug!(
            chars = prompt.len(),
            tokens_est = estimate_tokens(&prompt),
            include_elements,
            include_text,
            "user prompt composed"
        );
        prompt
    }
}

fn describe_step(ordinal: usize, step: &Step) -> String {
    let mut line = format!("{ordinal}. {} - {}", step.kind(), step.request.description);
    match &step.error {
        Some(error) => line.push_str(&format!(" (failed: {error})")),
        None => line.push_str(&format!(" ({:?})", step.status).to_lowercase()),
    }
    line
}

fn describe_element(ordinal: usize, element: &ElementInfo) -> String {
    let mut head = element.tag.clone();
    if let Some(id) = element.id.as_deref().filter(|id| !id.is_empty()) {
        head.push('#');
        head.push_str(id);
    }
    if let Some(kind) = element.kind.as_deref() {
        head.push_str(" type=");
        head.push_str(kind);
    }

    let mut line = format!("{ordinal}. [{head}]");
    let label = element.label();
    if !label.is_empty() {
        line.push_str(&format!(" \"{label}\""));
    }
    if !element.options.is_empty() {
        let shown = element.options.iter().take(4).cloned().collect::<Vec<_>>();
        line.push_str(&format!(" options: {}", shown.join(" | ")));
        if element.options.len() > 4 {
            line.push_str(&format!(" (+{} more)", element.options.len() - 4));
        }
    }
    if let Some(checked) = element.checked {
        line.push_str(if checked { " [checked]" } else { " [unchecked]" });
    }
    if element.disabled {
        line.push_str(" [disabled]");
    }
    if let Some(href) = element.href.as_deref().filter(|h| !h.is_empty()) {
        let mut shown: String = href.chars().take(60).collect();
        if shown.len() < href.len() {
            shown.push_str("...");
        }
        line.push_str(&format!(" -> {shown}"));
    }
    line.push_str(&format!(" selector={}", element.selector));
    line
}
