//! Deterministic in-memory browser.
//!
//! Holds a set of pre-registered pages and interprets the tagged scripts the
//! agent injects (see [`crate::script`]), mirroring the JSON contracts the
//! real page scripts return. Used by tests and the offline demo; it is the
//! analogue of wiring a mock transport into the adapter layer.

use std::collections::{HashMap, HashSet, VecDeque};

use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::BrowserError;
use crate::ports::BrowserSurface;
use crate::script::parse_tag;

/// One element of a registered page.
#[derive(Clone, Debug, Default)]
pub struct ElementModel {
    pub selector: String,
    pub tag: String,
    pub text: String,
    /// `type` attribute for inputs.
    pub kind: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    pub href: Option<String>,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub name: Option<String>,
    pub aria_label: Option<String>,
    pub role: Option<String>,
    pub data_test_id: Option<String>,
    pub checked: Option<bool>,
    pub disabled: bool,
    pub readonly: bool,
    pub options: Vec<String>,
    pub visible: bool,
}

impl ElementModel {
    pub fn new(selector: impl Into<String>, tag: impl Into<String>) -> Self {
        let selector = selector.into();
        let id = selector.strip_prefix('#').map(str::to_string);
        Self {
            selector,
            tag: tag.into(),
            id,
            visible: true,
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn is_search_input(&self) -> bool {
        let kind_is_search = self.kind.as_deref() == Some("search");
        let name_is_query = matches!(self.name.as_deref(), Some("q" | "query" | "search"));
        let placeholder_hints = self
            .placeholder
            .as_deref()
            .map(|p| p.to_ascii_lowercase().contains("search"))
            .unwrap_or(false);
        let role_is_search = self.role.as_deref() == Some("searchbox");
        kind_is_search || name_is_query || placeholder_hints || role_is_search
    }

    fn is_date_input(&self) -> bool {
        self.kind.as_deref() == Some("date")
            || self
                .class_name
                .as_deref()
                .map(|c| c.contains("date") || c.contains("calendar"))
                .unwrap_or(false)
    }

    fn is_clickable(&self) -> bool {
        matches!(self.tag.as_str(), "a" | "button" | "select")
            || matches!(
                self.kind.as_deref(),
                Some("button" | "submit" | "checkbox" | "radio")
            )
            || matches!(
                self.role.as_deref(),
                Some("button" | "link" | "checkbox" | "menuitem" | "tab" | "option")
            )
    }

    fn to_snapshot(&self, index: usize) -> Value {
        json!({
            "tag": self.tag,
            "selector": self.selector,
            "text": self.text,
            "type": self.kind,
            "placeholder": self.placeholder,
            "value": self.value,
            "href": self.href,
            "id": self.id,
            "className": self.class_name,
            "name": self.name,
            "ariaLabel": self.aria_label,
            "role": self.role,
            "dataTestId": self.data_test_id,
            "checked": self.checked,
            "selected": self.checked,
            "disabled": self.disabled,
            "readonly": self.readonly,
            "options": self.options,
            "visible": self.visible,
            "clickable": self.is_clickable(),
            "position": {
                "x": 10.0,
                "y": 10.0 + 30.0 * index as f64,
                "width": 160.0,
                "height": 24.0
            },
            "inViewport": index < 24,
            "isDateInput": self.is_date_input(),
            "isSearchInput": self.is_search_input(),
            "hasDropdown": self.tag == "select" || !self.options.is_empty(),
        })
    }
}

/// One registered page.
#[derive(Clone, Debug)]
pub struct PageModel {
    pub url: String,
    pub title: String,
    pub elements: Vec<ElementModel>,
    pub visible_text: String,
    pub html: String,
    pub headings: Vec<String>,
    pub meta_description: Option<String>,
    pub loading: bool,
}

impl PageModel {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            elements: Vec::new(),
            visible_text: String::new(),
            html: String::new(),
            headings: Vec::new(),
            meta_description: None,
            loading: false,
        }
    }

    pub fn blank(url: impl Into<String>) -> Self {
        Self::new(url, "Untitled")
    }

    pub fn with_element(mut self, element: ElementModel) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.visible_text = text.into();
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.headings.push(heading.into());
        self
    }

    pub fn with_meta_description(mut self, description: impl Into<String>) -> Self {
        self.meta_description = Some(description.into());
        self
    }

    pub fn still_loading(mut self) -> Self {
        self.loading = true;
        self
    }

    fn element(&self, selector: &str) -> Option<&ElementModel> {
        self.elements.iter().find(|e| e.selector == selector)
    }

    fn element_mut(&mut self, selector: &str) -> Option<&mut ElementModel> {
        self.elements.iter_mut().find(|e| e.selector == selector)
    }
}

/// Record of one tagged script call.
#[derive(Clone, Debug)]
pub struct ScriptCall {
    pub name: String,
    pub args: Value,
}

struct BrowserState {
    pages: HashMap<String, PageModel>,
    current: PageModel,
    click_nav: HashMap<String, String>,
    submit_nav: HashMap<String, String>,
    eval_results: VecDeque<Value>,
    failing_urls: HashSet<String>,
    failing_scripts: HashSet<String>,
    script_calls: Vec<ScriptCall>,
    nav_log: Vec<String>,
    events: Vec<String>,
}

impl Default for BrowserState {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
            current: PageModel::blank("about:blank"),
            click_nav: HashMap::new(),
            submit_nav: HashMap::new(),
            eval_results: VecDeque::new(),
            failing_urls: HashSet::new(),
            failing_scripts: HashSet::new(),
            script_calls: Vec::new(),
            nav_log: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl BrowserState {
    fn settle_on(&mut self, url: &str) {
        let page = self
            .pages
            .get(url)
            .or_else(|| self.pages.get(url.trim_end_matches('/')))
            .or_else(|| self.pages.get(&format!("{}/", url)))
            .cloned()
            .unwrap_or_else(|| PageModel::blank(url));
        self.current = page;
    }
}

/// In-memory [`BrowserSurface`] implementation.
pub struct InMemoryBrowser {
    state: Mutex<BrowserState>,
}

impl Default for InMemoryBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BrowserState::default()),
        }
    }

    pub fn with_page(self, page: PageModel) -> Self {
        self.state.lock().pages.insert(page.url.clone(), page);
        self
    }

    /// Register a page and make it current without a navigation.
    pub fn with_open_page(self, page: PageModel) -> Self {
        {
            let mut state = self.state.lock();
            state.pages.insert(page.url.clone(), page.clone());
            state.current = page;
        }
        self
    }

    pub fn add_page(&self, page: PageModel) {
        self.state.lock().pages.insert(page.url.clone(), page);
    }

    /// Clicking `selector` lands on `url`.
    pub fn on_click_navigate(&self, selector: impl Into<String>, url: impl Into<String>) {
        self.state
            .lock()
            .click_nav
            .insert(selector.into(), url.into());
    }

    /// Submitting the search box at `selector` lands on `url`.
    pub fn on_submit_navigate(&self, selector: impl Into<String>, url: impl Into<String>) {
        self.state
            .lock()
            .submit_nav
            .insert(selector.into(), url.into());
    }

    pub fn queue_eval_result(&self, value: Value) {
        self.state.lock().eval_results.push_back(value);
    }

    pub fn fail_navigation_to(&self, url: impl Into<String>) {
        self.state.lock().failing_urls.insert(url.into());
    }

    pub fn fail_script(&self, name: impl Into<String>) {
        self.state.lock().failing_scripts.insert(name.into());
    }

    pub fn remove_element(&self, selector: &str) {
        let mut state = self.state.lock();
        state.current.elements.retain(|e| e.selector != selector);
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.lock().current.loading = loading;
    }

    pub fn current_page(&self) -> PageModel {
        self.state.lock().current.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().nav_log.clone()
    }

    pub fn script_calls(&self) -> Vec<ScriptCall> {
        self.state.lock().script_calls.clone()
    }

    /// DOM events dispatched so far, as `"<event> <selector>"` strings.
    pub fn events(&self) -> Vec<String> {
        self.state.lock().events.clone()
    }

    pub fn count_events(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    fn dispatch(&self, name: &str, args: &Value) -> Value {
        let mut state = self.state.lock();
        match name {
            "collect_state" => {
                let page = &state.current;
                let elements: Vec<Value> = page
                    .elements
                    .iter()
                    .filter(|e| e.visible)
                    .enumerate()
                    .map(|(i, e)| e.to_snapshot(i))
                    .collect();
                json!({
                    "url": page.url,
                    "title": page.title,
                    "elements": elements,
                    "visibleText": page.visible_text,
                    "rawHtml": page.html,
                })
            }
            "extract" => {
                let page = &state.current;
                let headings: Vec<Value> = page
                    .headings
                    .iter()
                    .enumerate()
                    .map(|(i, text)| json!({"level": if i == 0 { 1 } else { 2 }, "text": text}))
                    .collect();
                let links: Vec<Value> = page
                    .elements
                    .iter()
                    .filter_map(|e| {
                        e.href
                            .as_ref()
                            .map(|href| json!({"text": e.text, "href": href}))
                    })
                    .collect();
                let sample: String = page.visible_text.chars().take(2000).collect();
                json!({
                    "url": page.url,
                    "title": page.title,
                    "headings": headings,
                    "links": links,
                    "lists": [],
                    "tables": [],
                    "forms": [],
                    "meta": {"description": page.meta_description},
                    "textSample": sample,
                    "pageKind": {
                        "searchResults": page.url.contains("search") || page.url.contains("?q="),
                        "product": false,
                        "article": page.headings.len() == 1 && page.visible_text.len() > 400,
                    },
                })
            }
            "click" | "double_click" | "right_click" | "hover" | "focus" | "blur" | "clear" => {
                let selector = args["selector"].as_str().unwrap_or_default().to_string();
                if state.current.element(&selector).is_none() {
                    return json!({"ok": false, "reason": "not-found"});
                }
                state.events.push(format!("{} {}", name, selector));
                if name == "clear" {
                    if let Some(el) = state.current.element_mut(&selector) {
                        el.value = Some(String::new());
                    }
                }
                if name == "click" {
                    let target = state.click_nav.get(&selector).cloned().or_else(|| {
                        state
                            .current
                            .element(&selector)
                            .and_then(|e| e.href.clone())
                    });
                    if let Some(url) = target {
                        state.nav_log.push(url.clone());
                        state.settle_on(&url);
                    }
                }
                json!({"ok": true})
            }
            "type" => {
                let selector = args["selector"].as_str().unwrap_or_default().to_string();
                let text = args["text"].as_str().unwrap_or_default().to_string();
                let search_box = match state.current.element(&selector) {
                    Some(el) => el.is_search_input(),
                    None => return json!({"ok": false, "reason": "not-found"}),
                };
                if let Some(el) = state.current.element_mut(&selector) {
                    el.value = Some(text);
                }
                state.events.push(format!("type {}", selector));
                json!({"ok": true, "searchBox": search_box})
            }
            "submit_search" => {
                let selector = args["selector"].as_str().unwrap_or_default().to_string();
                state.events.push(format!("submit {}", selector));
                if let Some(url) = state.submit_nav.get(&selector).cloned() {
                    state.nav_log.push(url.clone());
                    state.settle_on(&url);
                }
                json!({"ok": true})
            }
            "select_option" => {
                let selector = args["selector"].as_str().unwrap_or_default().to_string();
                let wanted = args["option"].as_str().unwrap_or_default().to_string();
                let matched = match state.current.element(&selector) {
                    None => return json!({"ok": false, "reason": "not-found"}),
                    Some(el) => el.options.iter().any(|o| o == &wanted),
                };
                if !matched {
                    return json!({"ok": false, "reason": "option-not-found"});
                }
                if let Some(el) = state.current.element_mut(&selector) {
                    el.value = Some(wanted.clone());
                }
                state.events.push(format!("select {} {}", selector, wanted));
                json!({"ok": true, "matched": "text"})
            }
            "set_checked" => {
                let selector = args["selector"].as_str().unwrap_or_default().to_string();
                let desired = args["desired"].as_bool().unwrap_or(true);
                let current = match state.current.element(&selector) {
                    None => return json!({"ok": false, "reason": "not-found"}),
                    Some(el) => {
                        let checkable = matches!(el.kind.as_deref(), Some("checkbox" | "radio"));
                        if !checkable {
                            return json!({"ok": false, "reason": "not-checkbox"});
                        }
                        el.checked.unwrap_or(false)
                    }
                };
                let changed = current != desired;
                if changed {
                    if let Some(el) = state.current.element_mut(&selector) {
                        el.checked = Some(desired);
                    }
                    state.events.push(format!("click {}", selector));
                }
                json!({"ok": true, "changed": changed})
            }
            "keypress" => {
                let selector = args["selector"].as_str().unwrap_or("body").to_string();
                if selector != "body" && state.current.element(&selector).is_none() {
                    return json!({"ok": false, "reason": "not-found"});
                }
                let key = args["key"].as_str().unwrap_or_default();
                state.events.push(format!("keypress {} {}", selector, key));
                json!({"ok": true})
            }
            "scroll" => {
                state.events.push("scroll".to_string());
                json!({"ok": true})
            }
            "element_visible" => {
                let selector = args["selector"].as_str().unwrap_or_default();
                let visible = state
                    .current
                    .element(selector)
                    .map(|e| e.visible)
                    .unwrap_or(false);
                json!({"visible": visible})
            }
            "content_ready" => {
                let page = &state.current;
                json!({"ready": !page.loading && page.visible_text.len() > 100})
            }
            other => {
                debug!(script = other, "unhandled tagged script");
                json!({"ok": false, "reason": "unsupported"})
            }
        }
    }
}

#[async_trait::async_trait]
impl BrowserSurface for InMemoryBrowser {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock();
        state.nav_log.push(url.to_string());
        if state.failing_urls.contains(url) {
            return Err(BrowserError::navigation_failed(url, "registered failure"));
        }
        state.settle_on(url);
        Ok(())
    }

    async fn run_script(&self, script: &str) -> Result<Value, BrowserError> {
        match parse_tag(script) {
            Some(tag) => {
                {
                    let mut state = self.state.lock();
                    if state.failing_scripts.contains(&tag.name) {
                        return Err(BrowserError::script(format!(
                            "registered failure for {}",
                            tag.name
                        )));
                    }
                    state.script_calls.push(ScriptCall {
                        name: tag.name.clone(),
                        args: tag.args.clone(),
                    });
                }
                Ok(self.dispatch(&tag.name, &tag.args))
            }
            None => {
                let mut state = self.state.lock();
                Ok(state.eval_results.pop_front().unwrap_or(Value::Null))
            }
        }
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.state.lock().current.url.clone())
    }

    async fn page_title(&self) -> Result<String, BrowserError> {
        Ok(self.state.lock().current.title.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::tag_script;

    fn login_page() -> PageModel {
        PageModel::new("https://example.com", "Example")
            .with_text("Welcome to Example. Sign in to continue with your account today.")
            .with_element(
                ElementModel::new("#login", "button")
                    .with_text("Login")
                    .with_kind("submit"),
            )
            .with_element(
                ElementModel::new("#agree", "input")
                    .with_kind("checkbox")
                    .with_checked(true),
            )
    }

    fn call(name: &str, args: Value) -> String {
        tag_script(name, &args, "(() => ({}))()")
    }

    #[tokio::test]
    async fn navigation_settles_on_registered_page() {
        let browser = InMemoryBrowser::new().with_page(login_page());
        browser.navigate("https://example.com").await.unwrap();
        assert_eq!(browser.current_url().await.unwrap(), "https://example.com");
        assert_eq!(browser.page_title().await.unwrap(), "Example");
    }

    #[tokio::test]
    async fn unknown_url_lands_on_blank_page() {
        let browser = InMemoryBrowser::new();
        browser.navigate("https://nowhere.test").await.unwrap();
        let state = browser
            .run_script(&call("collect_state", Value::Null))
            .await
            .unwrap();
        assert_eq!(state["url"], "https://nowhere.test");
        assert_eq!(state["elements"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn registered_failure_surfaces_as_navigation_error() {
        let browser = InMemoryBrowser::new();
        browser.fail_navigation_to("https://down.test");
        let err = browser.navigate("https://down.test").await.unwrap_err();
        assert!(err.is_navigation());
    }

    #[tokio::test]
    async fn checkbox_is_only_clicked_when_state_differs() {
        let browser = InMemoryBrowser::new().with_open_page(login_page());
        let out = browser
            .run_script(&call(
                "set_checked",
                serde_json::json!({"selector": "#agree", "desired": true}),
            ))
            .await
            .unwrap();
        assert_eq!(out["changed"], false);
        assert_eq!(browser.count_events("click #agree"), 0);

        let out = browser
            .run_script(&call(
                "set_checked",
                serde_json::json!({"selector": "#agree", "desired": false}),
            ))
            .await
            .unwrap();
        assert_eq!(out["changed"], true);
        assert_eq!(browser.count_events("click #agree"), 1);
    }

    #[tokio::test]
    async fn click_follows_configured_navigation() {
        let browser = InMemoryBrowser::new().with_open_page(login_page());
        browser.add_page(PageModel::new("https://example.com/dashboard", "Dashboard"));
        browser.on_click_navigate("#login", "https://example.com/dashboard");
        browser
            .run_script(&call("click", serde_json::json!({"selector": "#login"})))
            .await
            .unwrap();
        assert_eq!(
            browser.current_url().await.unwrap(),
            "https://example.com/dashboard"
        );
    }

    #[tokio::test]
    async fn untagged_scripts_drain_eval_queue() {
        let browser = InMemoryBrowser::new();
        browser.queue_eval_result(serde_json::json!(42));
        let out = browser.run_script("6 * 7").await.unwrap();
        assert_eq!(out, serde_json::json!(42));
        assert_eq!(browser.run_script("1 + 1").await.unwrap(), Value::Null);
    }
}
