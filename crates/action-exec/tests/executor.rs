//! Executor behavior against the in-memory browser.

use pagepilot_action_exec::{ActionExecutor, ActionError, ActionKind, ActionOptions, ActionRequest, ExecConfig};
use pagepilot_browser_port::{ElementModel, InMemoryBrowser, PageModel};
use serde_json::json;

fn executor() -> ActionExecutor {
    ActionExecutor::new(ExecConfig::minimal())
}

fn store_page() -> PageModel {
    PageModel::new("https://shop.test/", "Shop")
        .with_text(
            "All departments are open. Search thousands of products and add them to your cart \
             without leaving this page. Today only: laptops from $899.00.",
        )
        .with_element(
            ElementModel::new("#q", "input")
                .with_kind("search")
                .with_placeholder("Search products")
                .with_name("q"),
        )
        .with_element(
            ElementModel::new("#newsletter", "input")
                .with_kind("checkbox")
                .with_checked(false),
        )
        .with_element(
            ElementModel::new("#sort", "select").with_options(vec![
                "Relevance".to_string(),
                "Price: Low to High".to_string(),
            ]),
        )
        .with_element(
            ElementModel::new("#cart", "a")
                .with_text("Cart")
                .with_href("https://shop.test/cart"),
        )
}

#[tokio::test]
async fn click_dispatches_against_live_selector() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    let report = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Click, "Open the cart").with_selector("#cart"),
        )
        .await
        .unwrap();
    assert!(report.data.is_none());
    assert_eq!(browser.count_events("click #cart"), 1);
    // The link's href carried the page over.
    assert_eq!(
        browser.current_page().url,
        "https://shop.test/cart"
    );
}

#[tokio::test]
async fn stale_selector_fails_with_element_not_found() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    browser.remove_element("#cart");
    let err = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Click, "Open the cart").with_selector("#cart"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::ElementNotFound(sel) if sel == "#cart"));
}

#[tokio::test]
async fn typing_into_search_box_auto_submits() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    browser.add_page(
        PageModel::new("https://shop.test/results?q=laptop", "Results").with_text(
            "Showing 120 results for laptop. Prices start at $899.00 and go up from there.",
        ),
    );
    browser.on_submit_navigate("#q", "https://shop.test/results?q=laptop");

    let report = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Type, "Search for laptops")
                .with_selector("#q")
                .with_value(json!("laptop")),
        )
        .await
        .unwrap();

    assert_eq!(report.data.unwrap()["autoSubmitted"], true);
    assert_eq!(browser.count_events("submit #q"), 1);
    assert_eq!(
        browser.current_page().url,
        "https://shop.test/results?q=laptop"
    );
}

#[tokio::test]
async fn typing_into_plain_field_does_not_submit() {
    let page = store_page().with_element(
        ElementModel::new("#note", "textarea").with_placeholder("Delivery notes"),
    );
    let browser = InMemoryBrowser::new().with_open_page(page);
    let report = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Type, "Add a delivery note")
                .with_selector("#note")
                .with_value(json!("leave at door")),
        )
        .await
        .unwrap();
    assert!(report.data.is_none());
    assert_eq!(browser.count_events("submit"), 0);
}

#[tokio::test]
async fn check_is_idempotent() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    let exec = executor();

    let first = exec
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Check, "Opt into the newsletter")
                .with_selector("#newsletter"),
        )
        .await
        .unwrap();
    assert_eq!(first.data.unwrap()["changed"], true);
    assert_eq!(browser.count_events("click #newsletter"), 1);

    let second = exec
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Check, "Opt into the newsletter")
                .with_selector("#newsletter"),
        )
        .await
        .unwrap();
    assert_eq!(second.data.unwrap()["changed"], false);
    assert_eq!(browser.count_events("click #newsletter"), 1);
}

#[tokio::test]
async fn check_on_non_checkbox_is_rejected() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    let err = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Check, "Tick the cart").with_selector("#cart"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::NotACheckbox(_)));
}

#[tokio::test]
async fn dropdown_matches_by_visible_text() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    let report = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::SelectDropdown, "Sort by price")
                .with_selector("#sort")
                .with_value(json!("Price: Low to High")),
        )
        .await
        .unwrap();
    assert_eq!(report.data.unwrap()["matched"], "text");
}

#[tokio::test]
async fn missing_dropdown_option_is_reported() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    let err = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::SelectDropdown, "Sort by rating")
                .with_selector("#sort")
                .with_value(json!("Rating")),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(err, ActionError::OptionNotFound { option, .. } if option == "Rating")
    );
}

#[tokio::test]
async fn navigation_is_normalized_before_the_browser_sees_it() {
    let browser = InMemoryBrowser::new().with_page(store_page());
    executor()
        .execute(
            &browser,
            &ActionRequest::navigate("shop.test", "Open the shop"),
        )
        .await
        .unwrap();
    assert_eq!(browser.navigations(), vec!["https://shop.test/"]);
    assert_eq!(browser.current_page().title, "Shop");
}

#[tokio::test]
async fn navigation_failure_propagates() {
    let browser = InMemoryBrowser::new();
    browser.fail_navigation_to("https://down.test/");
    let err = executor()
        .execute(
            &browser,
            &ActionRequest::navigate("down.test", "Open the dead site"),
        )
        .await
        .unwrap_err();
    assert!(err.is_navigation());
}

#[tokio::test]
async fn wait_for_element_times_out_as_an_error() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    let err = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::WaitForElement, "Wait for a modal")
                .with_selector("#modal")
                .with_options(ActionOptions {
                    timeout: Some(30),
                    ..ActionOptions::default()
                }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::WaitTimeout { timeout_ms: 30, .. }));
}

#[tokio::test]
async fn dynamic_content_timeout_is_not_fatal() {
    let page = PageModel::new("https://slow.test", "Slow").still_loading();
    let browser = InMemoryBrowser::new().with_open_page(page);
    let report = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::WaitForDynamicContent, "Let results render")
                .with_options(ActionOptions {
                    timeout: Some(30),
                    ..ActionOptions::default()
                }),
        )
        .await
        .unwrap();
    assert!(report.warning.unwrap().contains("did not settle"));
}

#[tokio::test]
async fn extract_returns_enriched_structure() {
    let page = store_page()
        .with_heading("Today's deals")
        .with_meta_description("The shop for everything");
    let browser = InMemoryBrowser::new().with_open_page(page);
    let report = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Extract, "Capture the page"),
        )
        .await
        .unwrap();
    let data = report.data.unwrap();
    assert_eq!(data["headings"][0]["text"], "Today's deals");
    assert_eq!(data["prices"], json!(["$899.00"]));
    assert_eq!(data["meta"]["description"], "The shop for everything");
}

#[tokio::test]
async fn extract_degrades_on_script_fault() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    browser.fail_script("extract");
    let report = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Extract, "Capture the page"),
        )
        .await
        .unwrap();
    let data = report.data.unwrap();
    assert_eq!(data["url"], "https://shop.test/");
    assert!(data["note"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn evaluate_runs_raw_scripts() {
    let browser = InMemoryBrowser::new().with_open_page(store_page());
    browser.queue_eval_result(json!({"answer": 42}));
    let report = executor()
        .execute(
            &browser,
            &ActionRequest::new(ActionKind::Evaluate, "Read the answer")
                .with_value(json!("window.__answer")),
        )
        .await
        .unwrap();
    assert_eq!(report.data.unwrap()["answer"], 42);
}
