use std::time::{Duration, Instant};

use pagepilot_browser_port::BrowserSurface;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::ActionError;
use crate::extract;
use crate::model::{ActionRequest, PlannedAction, ScrollTarget, Selector};
use crate::scripts;

/// Executor tuning. `minimal()` shrinks every delay for tests.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Settle delay applied when a request asks for `waitAfter`.
    pub settle_after_ms: u64,
    /// Pause between typing into a search box and auto-submitting it.
    pub search_submit_delay_ms: u64,
    /// Viewport scroll increment in pixels.
    pub scroll_increment_px: u32,
    /// Poll interval for the waiting actions.
    pub poll_interval_ms: u64,
    /// Body text length above which dynamic content counts as present.
    pub content_ready_min_chars: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            settle_after_ms: 500,
            search_submit_delay_ms: 500,
            scroll_increment_px: 600,
            poll_interval_ms: 250,
            content_ready_min_chars: 100,
        }
    }
}

impl ExecConfig {
    pub fn minimal() -> Self {
        Self {
            settle_after_ms: 0,
            search_submit_delay_ms: 0,
            poll_interval_ms: 5,
            ..Self::default()
        }
    }
}

/// Outcome of a successfully executed action.
#[derive(Clone, Debug, Default)]
pub struct ActionReport {
    pub data: Option<Value>,
    pub warning: Option<String>,
    pub latency_ms: u64,
}

impl ActionReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Executes classified actions against a [`BrowserSurface`].
#[derive(Clone, Debug, Default)]
pub struct ActionExecutor {
    config: ExecConfig,
}

impl ActionExecutor {
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Classify and run one action. Selector re-resolution happens inside
    /// the page scripts, so staleness since sensing surfaces here as
    /// [`ActionError::ElementNotFound`].
    pub async fn execute(
        &self,
        browser: &dyn BrowserSurface,
        request: &ActionRequest,
    ) -> Result<ActionReport, ActionError> {
        let planned = request.classify()?;
        let started = Instant::now();

        if let Some(delay) = request.options.as_ref().and_then(|o| o.delay) {
            sleep(Duration::from_millis(delay)).await;
        }

        let mut report = self.dispatch(browser, planned).await?;

        if let Some(true) = request.options.as_ref().and_then(|o| o.wait_after) {
            sleep(Duration::from_millis(self.config.settle_after_ms)).await;
        }

        report.latency_ms = started.elapsed().as_millis() as u64;
        debug!(
            action = %request.action,
            latency_ms = report.latency_ms,
            "action executed"
        );
        Ok(report)
    }

    async fn dispatch(
        &self,
        browser: &dyn BrowserSurface,
        planned: PlannedAction,
    ) -> Result<ActionReport, ActionError> {
        match planned {
            PlannedAction::Navigate { url } => {
                let normalized = normalize_url(&url)?;
                info!(url = %normalized, "navigating");
                browser.navigate(&normalized).await?;
                Ok(ActionReport::with_data(json!({"url": normalized})))
            }
            PlannedAction::Click { selector } => {
                let outcome = browser.run_script(&scripts::click(&selector)).await?;
                check_outcome(&outcome, &selector, None)?;
                Ok(ActionReport::empty())
            }
            PlannedAction::Type { selector, text } => {
                let outcome = browser
                    .run_script(&scripts::type_text(&selector, &text))
                    .await?;
                check_outcome(&outcome, &selector, None)?;
                if outcome["searchBox"].as_bool() == Some(true) {
                    sleep(Duration::from_millis(self.config.search_submit_delay_ms)).await;
                    let submitted = browser
                        .run_script(&scripts::submit_search(&selector))
                        .await?;
                    check_outcome(&submitted, &selector, None)?;
                    info!(selector = %selector, "search box auto-submitted");
                    return Ok(ActionReport::with_data(json!({"autoSubmitted": true})));
                }
                Ok(ActionReport::empty())
            }
            PlannedAction::SelectDropdown { selector, option } => {
                let outcome = browser
                    .run_script(&scripts::select_option(&selector, &option))
                    .await?;
                check_outcome(&outcome, &selector, Some(&option))?;
                Ok(ActionReport::with_data(
                    json!({"matched": outcome["matched"]}),
                ))
            }
            PlannedAction::SetChecked { selector, desired } => {
                let outcome = browser
                    .run_script(&scripts::set_checked(&selector, desired))
                    .await?;
                check_outcome(&outcome, &selector, None)?;
                Ok(ActionReport::with_data(
                    json!({"changed": outcome["changed"]}),
                ))
            }
            PlannedAction::Clear { selector } => {
                let outcome = browser.run_script(&scripts::clear(&selector)).await?;
                check_outcome(&outcome, &selector, None)?;
                Ok(ActionReport::empty())
            }
            PlannedAction::Focus { selector } => {
                let outcome = browser.run_script(&scripts::focus(&selector)).await?;
                check_outcome(&outcome, &selector, None)?;
                Ok(ActionReport::empty())
            }
            PlannedAction::Blur { selector } => {
                let outcome = browser.run_script(&scripts::blur(&selector)).await?;
                check_outcome(&outcome, &selector, None)?;
                Ok(ActionReport::empty())
            }
            PlannedAction::Hover { selector } => {
                let outcome = browser.run_script(&scripts::hover(&selector)).await?;
                check_outcome(&outcome, &selector, None)?;
                Ok(ActionReport::empty())
            }
            PlannedAction::Keypress { selector, key } => {
                let outcome = browser
                    .run_script(&scripts::keypress(selector.as_ref(), &key))
                    .await?;
                let context = selector.unwrap_or_else(|| Selector::new("body"));
                check_outcome(&outcome, &context, None)?;
                Ok(ActionReport::empty())
            }
            PlannedAction::DoubleClick { selector } => {
                let outcome = browser.run_script(&scripts::double_click(&selector)).await?;
                check_outcome(&outcome, &selector, None)?;
                Ok(ActionReport::empty())
            }
            PlannedAction::RightClick { selector } => {
                let outcome = browser.run_script(&scripts::right_click(&selector)).await?;
                check_outcome(&outcome, &selector, None)?;
                Ok(ActionReport::empty())
            }
            PlannedAction::Scroll { target } => {
                let script = match &target {
                    ScrollTarget::Element(selector) => scripts::scroll_to_element(selector),
                    ScrollTarget::Viewport(direction) => {
                        scripts::scroll_viewport(*direction, self.config.scroll_increment_px)
                    }
                };
                let outcome = browser.run_script(&script).await?;
                if outcome["ok"].as_bool() != Some(true) {
                    warn!("scroll target not resolvable, treated as no-op");
                    return Ok(ActionReport::empty().with_warning("scroll target not found"));
                }
                Ok(ActionReport::empty())
            }
            PlannedAction::Wait { ms } => {
                sleep(Duration::from_millis(ms)).await;
                Ok(ActionReport::with_data(json!({"waitedMs": ms})))
            }
            PlannedAction::WaitForElement {
                selector,
                timeout_ms,
            } => {
                let deadline = Instant::now() + Duration::from_millis(timeout_ms);
                loop {
                    let outcome = browser
                        .run_script(&scripts::element_visible(&selector))
                        .await?;
                    if outcome["visible"].as_bool() == Some(true) {
                        return Ok(ActionReport::empty());
                    }
                    if Instant::now() >= deadline {
                        return Err(ActionError::WaitTimeout {
                            what: format!("element {}", selector),
                            timeout_ms,
                        });
                    }
                    sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                }
            }
            PlannedAction::WaitForDynamicContent { timeout_ms } => {
                let deadline = Instant::now() + Duration::from_millis(timeout_ms);
                loop {
                    let outcome = browser
                        .run_script(&scripts::content_ready(self.config.content_ready_min_chars))
                        .await?;
                    if outcome["ready"].as_bool() == Some(true) {
                        return Ok(ActionReport::empty());
                    }
                    if Instant::now() >= deadline {
                        // Timing out here is informational, not an error:
                        // the next sensing pass will show whatever arrived.
                        warn!(timeout_ms, "dynamic content wait timed out, continuing");
                        return Ok(ActionReport::empty().with_warning(format!(
                            "dynamic content did not settle within {}ms",
                            timeout_ms
                        )));
                    }
                    sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                }
            }
            PlannedAction::Extract => {
                let payload = match browser.run_script(&extract::extract_script()).await {
                    Ok(payload) => extract::enrich(payload),
                    Err(err) => {
                        warn!(error = %err, "extraction script faulted, using fallback payload");
                        let url = browser.current_url().await.unwrap_or_default();
                        let title = browser.page_title().await.unwrap_or_default();
                        extract::fallback_payload(&url, &title, &err.to_string())
                    }
                };
                Ok(ActionReport::with_data(payload))
            }
            PlannedAction::Evaluate { script } => {
                let value = browser.run_script(&script).await?;
                Ok(ActionReport::with_data(value))
            }
            PlannedAction::Complete { .. } => Err(ActionError::invalid(
                "complete is resolved by the task controller, not the executor",
            )),
        }
    }
}

/// Map a script's `{ok, reason}` response onto the error taxonomy.
fn check_outcome(
    outcome: &Value,
    selector: &Selector,
    option: Option<&str>,
) -> Result<(), ActionError> {
    if outcome["ok"].as_bool() == Some(true) {
        return Ok(());
    }
    match outcome["reason"].as_str() {
        Some("not-found") => Err(ActionError::ElementNotFound(selector.to_string())),
        Some("option-not-found") => Err(ActionError::OptionNotFound {
            selector: selector.to_string(),
            option: option.unwrap_or_default().to_string(),
        }),
        Some("not-checkbox") => Err(ActionError::NotACheckbox(selector.to_string())),
        Some(other) => Err(ActionError::ScriptFault(other.to_string())),
        None => Err(ActionError::ScriptFault(
            "malformed script response".to_string(),
        )),
    }
}

/// Prepend `https://` to scheme-less targets and validate the result.
pub fn normalize_url(raw: &str) -> Result<String, ActionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ActionError::invalid("navigate target is empty"));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = url::Url::parse(&candidate)
        .map_err(|e| ActionError::invalid(format!("invalid navigation target '{}': {}", raw, e)))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hosts_gain_https() {
        assert_eq!(
            normalize_url("example.com").unwrap(),
            "https://example.com/"
        );
        assert_eq!(
            normalize_url("http://example.com/a?b=1").unwrap(),
            "http://example.com/a?b=1"
        );
    }

    #[test]
    fn junk_targets_are_rejected() {
        assert!(normalize_url("").is_err());
        assert!(normalize_url("ht tp://x").is_err());
    }

    #[test]
    fn script_outcomes_map_to_errors() {
        let selector = Selector::new("#x");
        let not_found = json!({"ok": false, "reason": "not-found"});
        assert!(matches!(
            check_outcome(&not_found, &selector, None),
            Err(ActionError::ElementNotFound(_))
        ));
        let no_option = json!({"ok": false, "reason": "option-not-found"});
        assert!(matches!(
            check_outcome(&no_option, &selector, Some("Blue")),
            Err(ActionError::OptionNotFound { option, .. }) if option == "Blue"
        ));
        assert!(check_outcome(&json!({"ok": true}), &selector, None).is_ok());
    }
}
