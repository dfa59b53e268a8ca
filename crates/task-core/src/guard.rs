//! Loop detection.
//!
//! The model occasionally settles into a rut: re-reading the same
//! page forever, or hammering Enter on a control that goes nowhere.
//! The guard watches only the step history and intervenes before the
//! planner is consulted, either finishing the task with what was
//! gathered or forcing a strategy change. Thresholds are policy, not
//! algorithm, and stay configurable.

use pagepilot_action_exec::{ActionKind, ActionRequest};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::Step;

/// Guard thresholds and the escape destination.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Consecutive completed extracts that arm the extraction guard.
    pub extract_streak: usize,
    /// Total extracts required before the extraction guard fires.
    pub extract_total: usize,
    /// Window of trailing steps inspected for Enter presses.
    pub enter_window: usize,
    /// Enter presses within the window that trigger the escape.
    pub enter_threshold: usize,
    /// Search engine used to break out of a keypress loop.
    pub fallback_search_url: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            extract_streak: 3,
            extract_total: 10,
            enter_window: 5,
            enter_threshold: 3,
            fallback_search_url: "https://www.google.com".to_string(),
        }
    }
}

/// A forced decision, replacing this turn's planner call.
#[derive(Clone, Debug, PartialEq)]
pub enum GuardVerdict {
    /// Finish now; `warning` explains why in the task result.
    ForceComplete { warning: String },
    /// Execute this navigation instead of whatever the planner would
    /// have proposed.
    ForceNavigate { request: ActionRequest },
}

pub struct LoopGuard {
    config: GuardConfig,
}

impl LoopGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Inspect the history before planning. `Some` replaces the
    /// planner for this iteration.
    pub fn precheck(&self, instruction: &str, steps: &[Step]) -> Option<GuardVerdict> {
        if self.extraction_runaway(steps) {
            let warning = format!(
                "extraction loop detected: the last {} steps were all extracts ({} total); completing with the data gathered so far",
                self.config.extract_streak,
                steps.iter().filter(|s| s.kind() == ActionKind::Extract).count(),
            );
            warn!(%warning, "loop guard forcing completion");
            return Some(GuardVerdict::ForceComplete { warning });
        }
        if self.enter_runaway(steps) {
            let url = self.search_url(instruction);
            warn!(%url, "loop guard breaking Enter-key loop with a forced navigation");
            let request = ActionRequest::navigate(
                url,
                "Repeated Enter presses went nowhere; switching to a web search",
            );
            return Some(GuardVerdict::ForceNavigate { request });
        }
        None
    }

    /// Advisory only: the planner proposed typing into the same
    /// selector as the immediately preceding step. Logged, never
    /// blocked.
    pub fn note_repeated_type(&self, steps: &[Step], upcoming: &ActionRequest) -> bool {
        if upcoming.action != ActionKind::Type {
            return false;
        }
        let Some(last) = steps.last() else {
            return false;
        };
        if last.kind() != ActionKind::Type {
            return false;
        }
        let repeated = match (&last.request.selector, &upcoming.selector) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        if repeated {
            warn!(
                selector = %upcoming.selector.as_ref().map(|s| s.to_string()).unwrap_or_default(),
                "repeated type action against the same selector"
            );
        }
        repeated
    }

    fn extraction_runaway(&self, steps: &[Step]) -> bool {
        if steps.len() < self.config.extract_streak {
            return false;
        }
        let streak = steps[steps.len() - self.config.extract_streak..]
            .iter()
            .all(|s| s.kind() == ActionKind::Extract && s.is_completed());
        if !streak {
            return false;
        }
        let total = steps
            .iter()
            .filter(|s| s.kind() == ActionKind::Extract)
            .count();
        total >= self.config.extract_total
    }

    fn enter_runaway(&self, steps: &[Step]) -> bool {
        let window = steps.len().saturating_sub(self.config.enter_window);
        let enters = steps[window..]
            .iter()
            .filter(|s| {
                s.request
                    .keypress_key()
                    .map(|k| k.eq_ignore_ascii_case("enter"))
                    .unwrap_or(false)
            })
            .count();
        enters >= self.config.enter_threshold
    }

    fn search_url(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!(
            "{}/search?q={}",
            self.config.fallback_search_url.trim_end_matches('/'),
            encoded
        )
    }
}
