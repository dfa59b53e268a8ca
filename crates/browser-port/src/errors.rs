use thiserror::Error;

/// Faults surfaced by a browser implementation.
///
/// Navigation completion and failure must stay distinguishable: `navigate`
/// returning `Ok` means the load settled, while `NavigationFailed` /
/// `NavigationTimeout` mean the page never arrived.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("navigation to {url} timed out")]
    NavigationTimeout { url: String },

    #[error("script execution failed: {0}")]
    Script(String),

    #[error("browser surface unavailable: {0}")]
    Unavailable(String),
}

impl BrowserError {
    pub fn navigation_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NavigationFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn script(reason: impl Into<String>) -> Self {
        Self::Script(reason.into())
    }

    /// True when the fault happened while driving navigation rather than
    /// while running a script in an already-loaded page.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::NavigationFailed { .. } | Self::NavigationTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_errors_are_classified() {
        assert!(BrowserError::navigation_failed("https://x.test", "dns").is_navigation());
        assert!(!BrowserError::script("boom").is_navigation());
    }
}
