//! Prompt context selection.
//!
//! Full element listings and page text are the two largest prompt
//! sections, so each is included only when it is likely to matter for
//! the next decision. The rules live behind [`ContextPolicy`] so a
//! deployment can swap in its own selection logic without touching
//! the composer.

use pagepilot_action_exec::ActionKind;

use crate::model::Step;

/// Instruction words that signal the task will need to interact with
/// controls.
pub const INTERACTION_KEYWORDS: &[&str] = &["click", "type", "select", "button", "input", "form"];

/// Instruction words that signal the task is hunting for content.
pub const DISCOVERY_KEYWORDS: &[&str] = &[
    "find",
    "cheapest",
    "best",
    "compare",
    "extract",
    "price",
    "information",
    "search for",
];

/// Decides which optional page-state sections enter the user prompt.
pub trait ContextPolicy: Send + Sync {
    /// Should the interactive-element listing be included?
    fn include_elements(&self, instruction: &str, steps: &[Step]) -> bool;

    /// Should visible text and detected patterns be included?
    fn include_page_text(&self, instruction: &str, steps: &[Step]) -> bool;
}

/// Keyword and recent-history heuristics.
///
/// Elements are listed by default; they are dropped only when the
/// immediately preceding step was a read or wait, since the model is
/// then digesting content rather than choosing a control. Page text
/// is the opposite: expensive and usually irrelevant, included only
/// on demand.
pub struct KeywordContextPolicy {
    interaction: Vec<String>,
    discovery: Vec<String>,
}

impl Default for KeywordContextPolicy {
    fn default() -> Self {
        Self {
            interaction: INTERACTION_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            discovery: DISCOVERY_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl KeywordContextPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interaction_keywords(mut self, keywords: &[&str]) -> Self {
        self.interaction = keywords.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_discovery_keywords(mut self, keywords: &[&str]) -> Self {
        self.discovery = keywords.iter().map(|s| s.to_string()).collect();
        self
    }

    fn mentions(instruction: &str, keywords: &[String]) -> bool {
        let lowered = instruction.to_lowercase();
        keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

impl ContextPolicy for KeywordContextPolicy {
    fn include_elements(&self, instruction: &str, steps: &[Step]) -> bool {
        if Self::mentions(instruction, &self.interaction) {
            return true;
        }
        let recent = steps.len().saturating_sub(3);
        if steps[recent..].iter().any(|s| s.kind().is_interactive()) {
            return true;
        }
        match steps.last().map(Step::kind) {
            Some(ActionKind::Navigate) => true,
            // After a read or a wait the model is digesting, not
            // picking a control.
            Some(ActionKind::Extract)
            | Some(ActionKind::Wait)
            | Some(ActionKind::WaitForDynamicContent) => false,
            _ => true,
        }
    }

    fn include_page_text(&self, instruction: &str, steps: &[Step]) -> bool {
        if Self::mentions(instruction, &self.discovery) {
            return true;
        }
        matches!(
            steps.last().map(Step::kind),
            Some(ActionKind::Extract) | Some(ActionKind::WaitForDynamicContent)
        )
    }
}
