//! The task state machine.
//!
//! One iteration per step: sense the page, let the guard veto, plan
//! with the model, execute, record. The loop owns the only mutable
//! state (the task and its steps) and suspends only at awaits, so no
//! locking is needed anywhere inside; the single [`AtomicBool`] exists
//! purely to reject a second concurrent `execute_task` call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pagepilot_action_exec::{ActionExecutor, ActionKind, ActionRequest};
use pagepilot_browser_port::BrowserSurface;
use pagepilot_page_sense::PageSensor;
use serde_json::json;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::AgentConfig;
use crate::context::ContextPolicy;
use crate::errors::TaskError;
use crate::events::{NoopObserver, ProgressObserver};
use crate::guard::{GuardVerdict, LoopGuard};
use crate::llm::CompletionClient;
use crate::model::{Step, Task, TaskReport, TaskStatus};
use crate::planner::ActionPlanner;
use crate::prompt::PromptComposer;

/// Error recorded when the step budget runs out.
pub const MAX_STEPS_ERROR: &str = "maximum steps reached";

/// A finished run: the caller-facing report plus the full task record
/// for inspection.
#[derive(Clone, Debug)]
pub struct TaskRun {
    pub report: TaskReport,
    pub task: Task,
}

/// Drives tasks against one browser and one completion client.
///
/// Single-flight: a controller runs one task at a time and rejects
/// re-entrant calls with [`TaskError::AlreadyRunning`].
pub struct TaskController {
    config: AgentConfig,
    browser: Arc<dyn BrowserSurface>,
    llm: Arc<dyn CompletionClient>,
    observer: Arc<dyn ProgressObserver>,
    composer: PromptComposer,
    sensor: PageSensor,
    executor: ActionExecutor,
    planner: ActionPlanner,
    guard: LoopGuard,
    running: AtomicBool,
}

impl TaskController {
    pub fn new(
        config: AgentConfig,
        browser: Arc<dyn BrowserSurface>,
        llm: Arc<dyn CompletionClient>,
    ) -> Self {
        let sensor = PageSensor::new(config.sense.clone());
        let executor = ActionExecutor::new(config.exec.clone());
        let planner = ActionPlanner::new(config.llm_max_tokens);
        let guard = LoopGuard::new(config.guard.clone());
        Self {
            config,
            browser,
            llm,
            observer: Arc::new(NoopObserver),
            composer: PromptComposer::new(),
            sensor,
            executor,
            planner,
            guard,
            running: AtomicBool::new(false),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_context_policy(mut self, policy: Arc<dyn ContextPolicy>) -> Self {
        self.composer = PromptComposer::with_policy(policy);
        self
    }

    /// Run one instruction to a terminal state.
    ///
    /// Always returns a report once started; step-level trouble is
    /// recorded on the task rather than surfaced as an `Err`.
    pub async fn execute_task(&self, instruction: &str) -> Result<TaskRun, TaskError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(TaskError::AlreadyRunning);
        }

        let started = Instant::now();
        let mut task = Task::new(instruction);
        task.begin();
        info!(task_id = %task.id, instruction = %task.instruction, "task started");

        self.drive(&mut task).await;

        let report = TaskReport::from_task(&task, started.elapsed().as_millis() as u64);
        info!(
            task_id = %task.id,
            success = report.success,
            steps = task.steps.len(),
            elapsed_ms = report.execution_time_ms,
            "task finished"
        );
        self.running.store(false, Ordering::SeqCst);
        Ok(TaskRun { report, task })
    }

    async fn drive(&self, task: &mut Task) {
        while task.status == TaskStatus::Running {
            if task.steps.len() >= self.config.max_steps {
                warn!(task_id = %task.id, steps = task.steps.len(), "step budget exhausted");
                task.fail(MAX_STEPS_ERROR);
                return;
            }

            let state = self.sensor.sense(self.browser.as_ref()).await;

            let planned = match self.guard.precheck(&task.instruction, &task.steps) {
                Some(GuardVerdict::ForceComplete { warning }) => {
                    let extracted = task
                        .steps
                        .iter()
                        .rev()
                        .find(|s| s.kind() == ActionKind::Extract && s.is_completed())
                        .and_then(|s| s.result.clone());
                    task.complete(Some(json!({
                        "warning": warning,
                        "extracted": extracted,
                    })));
                    return;
                }
                Some(GuardVerdict::ForceNavigate { request }) => request,
                None => {
                    let prompt = self.composer.compose(&task.instruction, &state, &task.steps);
                    let planned = self.planner.plan(self.llm.as_ref(), &prompt).await;
                    if planned.action == ActionKind::Complete {
                        info!(task_id = %task.id, "planner declared the task complete");
                        task.complete(planned.result.clone());
                        return;
                    }
                    self.guard.note_repeated_type(&task.steps, &planned);
                    planned
                }
            };

            if self.run_step(task, planned).await {
                return;
            }

            if self.config.inter_step_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.inter_step_delay_ms)).await;
            }
        }
    }

    /// Execute one step. Returns `true` when the failure was fatal
    /// for the whole task.
    async fn run_step(&self, task: &mut Task, request: ActionRequest) -> bool {
        let kind = request.action;
        let index = task.steps.len();
        task.steps.push(Step::new(request));
        self.notify(task, index);

        task.steps[index].begin();
        self.notify(task, index);

        let request = task.steps[index].request.clone();
        match self.executor.execute(self.browser.as_ref(), &request).await {
            Ok(report) => {
                if let Some(warning) = &report.warning {
                    warn!(task_id = %task.id, step = index + 1, %warning, "step completed with warning");
                }
                task.steps[index].complete(report.data);
            }
            Err(error) => {
                let message = error.to_string();
                warn!(
                    task_id = %task.id,
                    step = index + 1,
                    action = %kind,
                    error = %message,
                    "step failed"
                );
                task.steps[index].fail(message.as_str());
                // A task that cannot reach its starting point has
                // nothing to continue from.
                if kind == ActionKind::Navigate && index < self.config.fatal_navigation_window {
                    task.fail(format!("early navigation failed: {message}"));
                    self.notify(task, index);
                    return true;
                }
            }
        }
        self.notify(task, index);
        false
    }

    fn notify(&self, task: &Task, index: usize) {
        if let Some(step) = task.steps.get(index) {
            self.observer.on_step(task, step);
        }
    }
}
