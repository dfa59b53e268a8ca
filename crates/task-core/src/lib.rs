//! Task orchestration: the perception-decision-action loop.
//!
//! This crate owns everything between "a natural-language instruction
//! arrives" and "a task report leaves": the [`Task`]/[`Step`] record
//! model, prompt composition, the completion-client port, reply
//! parsing with its wait fallback, the loop guard, and the
//! [`TaskController`] that drives one sense/plan/act cycle per step.
//!
//! The controller is deliberately thin on browser knowledge. It talks
//! to the page through `pagepilot_browser_port::BrowserSurface`, reads
//! page state through `pagepilot_page_sense::PageSensor`, and performs
//! actions through `pagepilot_action_exec::ActionExecutor`. Swapping
//! the browser or the language model never touches the loop itself.

pub mod config;
pub mod context;
pub mod controller;
pub mod errors;
pub mod events;
pub mod guard;
pub mod llm;
pub mod llm_http;
pub mod model;
pub mod planner;
pub mod prompt;
pub mod todo;

pub use config::AgentConfig;
pub use context::{ContextPolicy, KeywordContextPolicy};
pub use controller::{TaskController, TaskRun, MAX_STEPS_ERROR};
pub use errors::TaskError;
pub use events::{NoopObserver, ProgressObserver, TracingObserver};
pub use guard::{GuardConfig, GuardVerdict, LoopGuard};
pub use llm::{CompletionClient, LlmError, MockCompletion};
pub use llm_http::{HttpCompletion, HttpLlmConfig};
pub use model::{Step, StepStatus, Task, TaskReport, TaskStatus};
pub use planner::ActionPlanner;
pub use prompt::{PromptComposer, SYSTEM_PROMPT};
pub use todo::TodoOutline;
