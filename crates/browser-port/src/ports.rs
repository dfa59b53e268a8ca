use async_trait::async_trait;
use serde_json::Value;

use crate::errors::BrowserError;

/// The page surface the agent drives.
///
/// Implementations only need navigation and script injection; URL and title
/// reads have provided implementations built atop `run_script`.
#[async_trait]
pub trait BrowserSurface: Send + Sync {
    /// Drive the page to `url` and wait for the load to settle.
    ///
    /// `Ok(())` means the navigation completed. Load failures and timeouts
    /// come back as [`BrowserError::NavigationFailed`] /
    /// [`BrowserError::NavigationTimeout`].
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Inject a script into the current page and return its result as JSON.
    async fn run_script(&self, script: &str) -> Result<Value, BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError> {
        let value = self.run_script("window.location.href").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn page_title(&self) -> Result<String, BrowserError> {
        let value = self.run_script("document.title").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}
