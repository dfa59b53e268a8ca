//! Controller-level errors.
//!
//! Step-level trouble (dead selectors, timeouts, script faults) is
//! recorded on the [`crate::Step`] and never surfaces here. The only
//! hard error a caller can see is asking a controller to run two
//! tasks at once.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    /// The controller is single-flight: one task at a time.
    #[error("a task is already running on this controller")]
    AlreadyRunning,
}
