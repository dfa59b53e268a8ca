//! Progress observation.
//!
//! The controller reports every step creation and status change
//! through this callback. Observers run synchronously on the task
//! loop, so they must stay cheap; anything slow belongs behind a
//! channel owned by the observer.

use tracing::info;

use crate::model::{Step, Task};

pub trait ProgressObserver: Send + Sync {
    fn on_step(&self, task: &Task, step: &Step);
}

/// Discards all notifications.
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_step(&self, _task: &Task, _step: &Step) {}
}

/// Logs one line per notification.
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_step(&self, task: &Task, step: &Step) {
        info!(
            task_id = %task.id,
            step = task.steps.len(),
            action = %step.kind(),
            status = ?step.status,
            description = %step.request.description,
            "step update"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_action_exec::{ActionKind, ActionRequest};
    use parking_lot::Mutex;
    use std::sync::Arc;

    pub(crate) struct RecordingObserver {
        pub seen: Arc<Mutex<Vec<(ActionKind, crate::model::StepStatus)>>>,
    }

    impl ProgressObserver for RecordingObserver {
        fn on_step(&self, _task: &Task, step: &Step) {
            self.seen.lock().push((step.kind(), step.status));
        }
    }

    #[test]
    fn observers_see_each_update() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer = RecordingObserver { seen: seen.clone() };
        let mut task = Task::new("demo");
        task.begin();
        let mut step = Step::new(ActionRequest::new(ActionKind::Scroll, "scroll"));
        task.steps.push(step.clone());
        observer.on_step(&task, &task.steps[0]);
        step.begin();
        observer.on_step(&task, &step);
        assert_eq!(seen.lock().len(), 2);
    }
}
