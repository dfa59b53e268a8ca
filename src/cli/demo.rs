use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde_json::json;
use tracing::info;

use pagepilot_browser_port::{ElementModel, InMemoryBrowser, PageModel};
use pagepilot_task_core::{AgentConfig, MockCompletion, TaskController, TracingObserver};

use super::output::{print_run, OutputFormat};
use super::runtime::FileConfig;

#[derive(Args, Clone, Debug)]
pub struct DemoArgs {
    /// Use production pacing instead of running as fast as possible
    #[arg(long)]
    pub slow: bool,
}

/// The storefront both `demo` and `run` drive: a home page with a
/// search box, one search-results page, product pages and a deals
/// page. Submitting the search box always lands on the laptop
/// results, whatever was typed.
pub fn demo_site() -> InMemoryBrowser {
    let home = PageModel::new("https://shop.test/", "PagePilot Outlet")
        .with_heading("Today's deals")
        .with_text(
            "Welcome to the PagePilot Outlet. Today's deals cover laptops, monitors and \
             accessories, with free shipping on orders over $50. Use the search box to find \
             a product, or browse the deals page for this week's markdowns.",
        )
        .with_meta_description("Demo storefront for the PagePilot agent")
        .with_element(
            ElementModel::new("#q", "input")
                .with_kind("search")
                .with_placeholder("Search products"),
        )
        .with_element(
            ElementModel::new("#deals", "a")
                .with_text("Deals")
                .with_href("https://shop.test/deals"),
        )
        .with_element(ElementModel::new("#sort", "select").with_options(vec![
            "Relevance".to_string(),
            "Price: Low to High".to_string(),
            "Price: High to Low".to_string(),
        ]))
        .with_element(
            ElementModel::new("#newsletter", "input")
                .with_kind("checkbox")
                .with_checked(false),
        );

    let results = PageModel::new(
        "https://shop.test/search?q=laptop",
        "Search results - PagePilot Outlet",
    )
    .with_heading("Search results")
    .with_text(
        "3 results for laptop. The Aurora 14 ultraportable sells for $749.00, the Nimbus \
         Pro 16 workstation for $1,299.00, and the refurbished Brick 15 for $399.99. All \
         three ship within two business days.",
    )
    .with_meta_description("Laptop search results")
    .with_element(
        ElementModel::new("#p1", "a")
            .with_text("Aurora 14 - $749.00")
            .with_href("https://shop.test/aurora-14"),
    )
    .with_element(
        ElementModel::new("#p2", "a")
            .with_text("Nimbus Pro 16 - $1,299.00")
            .with_href("https://shop.test/nimbus-pro-16"),
    )
    .with_element(
        ElementModel::new("#p3", "a")
            .with_text("Brick 15 - $399.99")
            .with_href("https://shop.test/brick-15"),
    );

    let product = PageModel::new("https://shop.test/aurora-14", "Aurora 14 - PagePilot Outlet")
        .with_heading("Aurora 14")
        .with_text(
            "Aurora 14 ultraportable. 14-inch display, 16 GB RAM, 512 GB SSD, weighs 1.2 kg. \
             Price today: $749.00. Order before 11:30 AM and it ships the same day.",
        )
        .with_meta_description("Aurora 14 ultraportable laptop")
        .with_element(
            ElementModel::new("#add", "button")
                .with_text("Add to cart")
                .with_kind("submit"),
        )
        .with_element(ElementModel::new("#qty", "select").with_options(vec![
            "1".to_string(),
            "2".to_string(),
            "3".to_string(),
        ]));

    let deals = PageModel::new("https://shop.test/deals", "Deals - PagePilot Outlet")
        .with_heading("Deals")
        .with_text("Weekly deals refresh every Monday at 9:00 AM. Check back often.");

    let browser = InMemoryBrowser::new()
        .with_page(home)
        .with_page(results)
        .with_page(product)
        .with_page(deals);
    browser.on_submit_navigate("#q", "https://shop.test/search?q=laptop");
    browser
}

/// The scripted decisions the demo model makes: search, open the
/// cheapest sensible result, read it, report the price.
fn demo_completion() -> MockCompletion {
    MockCompletion::new()
        .with_action(&json!({
            "action": "navigate",
            "target": "https://shop.test",
            "description": "Open the PagePilot Outlet",
            "reasoning": "The task names the site directly"
        }))
        .with_action(&json!({
            "action": "type",
            "selector": "#q",
            "value": "laptop",
            "description": "Search for laptops"
        }))
        .with_action(&json!({
            "action": "click",
            "selector": "#p1",
            "description": "Open the Aurora 14 listing",
            "reasoning": "Cheapest non-refurbished result"
        }))
        .with_action(&json!({
            "action": "extract",
            "description": "Read the product page"
        }))
        .with_action(&json!({
            "action": "complete",
            "description": "Report the laptop and its price",
            "result": {
                "item": "Aurora 14",
                "price": "$749.00",
                "url": "https://shop.test/aurora-14"
            }
        }))
}

pub async fn cmd_demo(args: DemoArgs, config: FileConfig, output: &OutputFormat) -> Result<()> {
    let agent = if args.slow {
        config.agent
    } else {
        AgentConfig::minimal()
    };

    let browser = Arc::new(demo_site());
    let llm = Arc::new(demo_completion());
    let controller = TaskController::new(agent, browser, llm)
        .with_observer(Arc::new(TracingObserver));

    info!("Running the scripted storefront demo");
    let run = controller
        .execute_task("Find an affordable laptop on shop.test and report its price")
        .await?;
    print_run(&run, output)
}
