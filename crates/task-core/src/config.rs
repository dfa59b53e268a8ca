//! Agent configuration.

use pagepilot_action_exec::ExecConfig;
use pagepilot_page_sense::SenseBudget;
use serde::{Deserialize, Serialize};

use crate::guard::GuardConfig;

/// Everything the controller needs to know about pacing and budgets.
///
/// The defaults are the production values; `minimal()` strips all
/// waiting for tests. Loaded from YAML by the CLI, every field
/// defaulting independently so partial files stay valid.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hard ceiling on steps per task.
    pub max_steps: usize,
    /// Pause between steps so pages settle and rate limits stay happy.
    pub inter_step_delay_ms: u64,
    /// A failed `navigate` within this many initial steps kills the
    /// task; later navigation failures stay step-local.
    pub fatal_navigation_window: usize,
    /// Token ceiling passed to the completion client per plan call.
    pub llm_max_tokens: u32,
    pub guard: GuardConfig,
    pub sense: SenseBudget,
    pub exec: ExecConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 20,
            inter_step_delay_ms: 500,
            fatal_navigation_window: 2,
            llm_max_tokens: 1024,
            guard: GuardConfig::default(),
            sense: SenseBudget::default(),
            exec: ExecConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Zero-delay profile for tests and demos against the in-memory
    /// browser.
    pub fn minimal() -> Self {
        Self {
            inter_step_delay_ms: 0,
            exec: ExecConfig::minimal(),
            ..Self::default()
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_inter_step_delay_ms(mut self, delay_ms: u64) -> Self {
        self.inter_step_delay_ms = delay_ms;
        self
    }

    pub fn with_guard(mut self, guard: GuardConfig) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_sense(mut self, sense: SenseBudget) -> Self {
        self.sense = sense;
        self
    }
}
