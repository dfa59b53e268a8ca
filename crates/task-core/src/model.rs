//! Task and step records.
//!
//! A [`Task`] is one instruction plus the ordered list of [`Step`]s
//! taken while working on it. Both carry a small status machine whose
//! transitions are guarded: an illegal transition is refused and
//! logged rather than silently applied, so a bug in the loop cannot
//! resurrect a finished task.

use chrono::{DateTime, Utc};
use pagepilot_action_exec::{ActionKind, ActionRequest};
use pagepilot_core_types::{StepId, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Lifecycle of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Lifecycle of a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

/// One planned action and its execution record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    /// The action exactly as planned, wire shape preserved.
    pub request: ActionRequest,
    pub status: StepStatus,
    /// Execution payload (extraction data, auto-submit note, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Step {
    pub fn new(request: ActionRequest) -> Self {
        Self {
            id: StepId::new(),
            request,
            status: StepStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.request.action
    }

    /// Pending -> Running. Refused from any other state.
    pub fn begin(&mut self) -> bool {
        if self.status != StepStatus::Pending {
            warn!(step_id = %self.id, status = ?self.status, "refusing to start a non-pending step");
            return false;
        }
        self.status = StepStatus::Running;
        self.started_at = Some(Utc::now());
        true
    }

    /// Running -> Completed. Refused from any other state.
    pub fn complete(&mut self, result: Option<Value>) -> bool {
        if self.status != StepStatus::Running {
            warn!(step_id = %self.id, status = ?self.status, "refusing to complete a non-running step");
            return false;
        }
        self.status = StepStatus::Completed;
        self.result = result;
        self.finished_at = Some(Utc::now());
        true
    }

    /// Running -> Failed. Refused from any other state.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.status != StepStatus::Running {
            warn!(step_id = %self.id, status = ?self.status, "refusing to fail a non-running step");
            return false;
        }
        self.status = StepStatus::Failed;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

/// One instruction and everything done in its service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub instruction: String,
    pub status: TaskStatus,
    pub steps: Vec<Step>,
    /// Final payload: the `result` of a `complete` action, or the
    /// guard's warning summary when completion was forced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            instruction: instruction.into(),
            status: TaskStatus::Pending,
            steps: Vec::new(),
            result: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Pending -> Running. Refused from any other state.
    pub fn begin(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            warn!(task_id = %self.id, status = ?self.status, "refusing to start a non-pending task");
            return false;
        }
        self.status = TaskStatus::Running;
        true
    }

    /// Running -> Completed. Refused from any other state.
    pub fn complete(&mut self, result: Option<Value>) -> bool {
        if self.status != TaskStatus::Running {
            warn!(task_id = %self.id, status = ?self.status, "refusing to complete a non-running task");
            return false;
        }
        self.status = TaskStatus::Completed;
        self.result = result;
        self.finished_at = Some(Utc::now());
        true
    }

    /// Running -> Failed. Refused from any other state.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.status != TaskStatus::Running {
            warn!(task_id = %self.id, status = ?self.status, "refusing to fail a non-running task");
            return false;
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.is_completed()).count()
    }

    /// Most recent `count` steps, oldest first.
    pub fn recent_steps(&self, count: usize) -> &[Step] {
        let start = self.steps.len().saturating_sub(count);
        &self.steps[start..]
    }
}

/// Caller-facing summary of a finished task.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl TaskReport {
    pub fn from_task(task: &Task, execution_time_ms: u64) -> Self {
        Self {
            success: task.status == TaskStatus::Completed,
            data: task.result.clone(),
            error: task.error.clone(),
            execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn any_step() -> Step {
        Step::new(ActionRequest::navigate("https://example.com", "Open the site"))
    }

    #[test]
    fn step_lifecycle_is_monotonic() {
        let mut step = any_step();
        assert!(step.begin());
        assert!(step.complete(Some(json!({"ok": true}))));
        // Terminal states are final.
        assert!(!step.fail("late failure"));
        assert_eq!(step.status, StepStatus::Completed);
        assert!(step.error.is_none());
        assert!(step.started_at.is_some());
        assert!(step.finished_at.is_some());
    }

    #[test]
    fn step_cannot_complete_before_starting() {
        let mut step = any_step();
        assert!(!step.complete(None));
        assert_eq!(step.status, StepStatus::Pending);
    }

    #[test]
    fn task_failure_keeps_error_and_rejects_revival() {
        let mut task = Task::new("buy a laptop");
        assert!(task.begin());
        assert!(task.fail("navigation failed early"));
        assert!(!task.complete(Some(json!({"ok": true}))));
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("navigation failed early"));
        assert!(task.result.is_none());
    }

    #[test]
    fn recent_steps_returns_tail_in_order() {
        let mut task = Task::new("scroll around");
        for i in 0..5 {
            task.steps
                .push(Step::new(ActionRequest::new(ActionKind::Scroll, format!("Scroll {i}"))));
        }
        let tail = task.recent_steps(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].request.description, "Scroll 2");
        assert_eq!(tail[2].request.description, "Scroll 4");
        assert_eq!(task.recent_steps(99).len(), 5);
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = TaskReport {
            success: true,
            data: Some(json!({"price": "$9.99"})),
            error: None,
            execution_time_ms: 1234,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["executionTimeMs"], 1234);
        assert!(value.get("error").is_none());
    }
}
