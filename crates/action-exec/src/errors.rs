use pagepilot_browser_port::BrowserError;
use thiserror::Error;

/// Faults raised while classifying or executing a single action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The request's fields do not form a valid instance of its action kind.
    #[error("invalid action request: {0}")]
    Invalid(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("option '{option}' not found in dropdown {selector}")]
    OptionNotFound { selector: String, option: String },

    #[error("element {0} is not a checkbox or radio input")]
    NotACheckbox(String),

    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    WaitTimeout { what: String, timeout_ms: u64 },

    #[error("page script fault: {0}")]
    ScriptFault(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

impl ActionError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    /// True when the underlying fault was a navigation failure, as opposed
    /// to an in-page script problem.
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Browser(err) if err.is_navigation())
    }
}
