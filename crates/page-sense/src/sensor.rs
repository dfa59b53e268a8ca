use pagepilot_browser_port::BrowserSurface;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{PageState, SnapshotPayload};
use crate::{patterns, scripts, text};

/// Size limits applied to every snapshot.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SenseBudget {
    /// Maximum elements kept in the snapshot, most relevant first.
    pub max_elements: usize,
    /// Maximum characters of visible text.
    pub max_text_chars: usize,
    /// Maximum characters of raw HTML excerpt.
    pub max_html_chars: usize,
    /// Visible-text length above which the page counts as having content.
    pub content_threshold: usize,
}

impl Default for SenseBudget {
    fn default() -> Self {
        Self {
            max_elements: 20,
            max_text_chars: 5_000,
            max_html_chars: 15_000,
            content_threshold: 100,
        }
    }
}

impl SenseBudget {
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub fn with_max_text_chars(mut self, max_text_chars: usize) -> Self {
        self.max_text_chars = max_text_chars;
        self
    }
}

/// The Page State Sensor.
///
/// `sense` is infallible by contract: faults in script execution or payload
/// parsing degrade to a placeholder state with an empty element list.
#[derive(Clone, Debug, Default)]
pub struct PageSensor {
    budget: SenseBudget,
}

impl PageSensor {
    pub fn new(budget: SenseBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &SenseBudget {
        &self.budget
    }

    pub async fn sense(&self, browser: &dyn BrowserSurface) -> PageState {
        let script = scripts::collect_page_state(&self.budget);
        match browser.run_script(&script).await {
            Ok(value) => match self.shape(value) {
                Ok(state) => {
                    debug!(
                        url = %state.url,
                        elements = state.elements.len(),
                        text_chars = state.visible_text.chars().count(),
                        "page state sensed"
                    );
                    state
                }
                Err(reason) => self.degraded(browser, &reason).await,
            },
            Err(err) => self.degraded(browser, &err.to_string()).await,
        }
    }

    /// Apply budgets and derived fields to the raw script payload.
    fn shape(&self, value: Value) -> Result<PageState, String> {
        let payload: SnapshotPayload =
            serde_json::from_value(value).map_err(|e| format!("malformed snapshot: {}", e))?;

        let mut elements = payload.elements;
        // Most relevant first: in-viewport before off-screen, clickable
        // before passive, stable within each group.
        elements.sort_by_key(|e| (!e.in_viewport, !e.clickable));
        elements.truncate(self.budget.max_elements);

        let visible_text = text::clip(&payload.visible_text, self.budget.max_text_chars);
        let raw_html = text::clip(&payload.raw_html, self.budget.max_html_chars);
        let has_content = payload.visible_text.chars().count() > self.budget.content_threshold;
        let patterns = patterns::detect(&visible_text);

        Ok(PageState {
            url: payload.url,
            title: payload.title,
            elements,
            visible_text,
            raw_html,
            patterns,
            has_content,
        })
    }

    async fn degraded(&self, browser: &dyn BrowserSurface, reason: &str) -> PageState {
        warn!(reason, "page sensing degraded");
        let url = browser.current_url().await.unwrap_or_default();
        let title = browser.page_title().await.unwrap_or_default();
        PageState {
            url,
            title,
            visible_text: format!("(page state unavailable: {})", reason),
            ..PageState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_browser_port::{ElementModel, InMemoryBrowser, PageModel};

    fn shop_page() -> PageModel {
        let mut page = PageModel::new("https://shop.test", "Shop")
            .with_text(
                "Deals today: laptop $1,299.99 and mouse $19.99. Flash sale ends 5:00 PM. \
                 Thousands of products across every department are discounted right now.",
            )
            .with_element(
                ElementModel::new("#q", "input")
                    .with_kind("search")
                    .with_placeholder("Search products"),
            );
        for i in 0..30 {
            page = page.with_element(
                ElementModel::new(format!("a.item:nth-of-type({})", i + 1), "a")
                    .with_text(format!("Item {}", i))
                    .with_href(format!("https://shop.test/item/{}", i)),
            );
        }
        page
    }

    #[tokio::test]
    async fn snapshot_is_capped_to_budget() {
        let browser = InMemoryBrowser::new().with_open_page(shop_page());
        let sensor = PageSensor::default();
        let state = sensor.sense(&browser).await;
        assert_eq!(state.elements.len(), 20);
        assert!(state.has_content);
        assert_eq!(state.patterns.prices, vec!["$1,299.99", "$19.99"]);
        assert_eq!(state.patterns.times, vec!["5:00 PM"]);
    }

    #[tokio::test]
    async fn tiny_budget_clips_text() {
        let browser = InMemoryBrowser::new().with_open_page(shop_page());
        let sensor = PageSensor::new(SenseBudget::default().with_max_text_chars(40));
        let state = sensor.sense(&browser).await;
        assert!(state.visible_text.ends_with("[truncated]"));
        // has_content judges the uncut text, not the clipped excerpt.
        assert!(state.has_content);
    }

    #[tokio::test]
    async fn script_failure_degrades_instead_of_erroring() {
        let browser = InMemoryBrowser::new().with_open_page(shop_page());
        browser.fail_script("collect_state");
        let state = PageSensor::default().sense(&browser).await;
        assert!(state.elements.is_empty());
        assert!(!state.has_content);
        assert!(state.visible_text.contains("page state unavailable"));
        assert_eq!(state.url, "https://shop.test");
    }

    #[tokio::test]
    async fn sparse_page_has_no_content() {
        let page = PageModel::new("https://empty.test", "Empty").with_text("Loading");
        let browser = InMemoryBrowser::new().with_open_page(page);
        let state = PageSensor::default().sense(&browser).await;
        assert!(!state.has_content);
    }
}
