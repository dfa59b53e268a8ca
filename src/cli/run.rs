use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use pagepilot_task_core::{HttpCompletion, TaskController, TracingObserver};

use super::demo::demo_site;
use super::output::{print_run, OutputFormat};
use super::runtime::FileConfig;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Natural-language instruction for the agent
    pub instruction: String,

    /// Chat-completions URL (any OpenAI-compatible endpoint)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model name to request from the endpoint
    #[arg(long)]
    pub model: Option<String>,

    /// API key; falls back to OPENAI_API_KEY
    #[arg(long)]
    pub api_key: Option<String>,

    /// Step ceiling for this run
    #[arg(long)]
    pub max_steps: Option<usize>,
}

/// Drive the built-in storefront with a live model. The pages are
/// canned but every other part of the loop is the real thing, so
/// this is the quickest way to watch a model plan against actual
/// page state.
pub async fn cmd_run(args: RunArgs, config: FileConfig, output: &OutputFormat) -> Result<()> {
    let mut agent = config.agent;
    if let Some(max_steps) = args.max_steps {
        agent.max_steps = max_steps;
    }

    let mut llm_config = config.llm;
    if let Some(endpoint) = args.endpoint {
        llm_config.api_url = endpoint;
    }
    if let Some(model) = args.model {
        llm_config.model = model;
    }
    if let Some(key) = args
        .api_key
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    {
        llm_config.api_key = Some(key);
    }

    info!(
        endpoint = %llm_config.api_url,
        model = %llm_config.model,
        "Connecting to completion endpoint"
    );
    let llm = Arc::new(HttpCompletion::new(llm_config)?);

    let browser = Arc::new(demo_site());
    let controller = TaskController::new(agent, browser, llm)
        .with_observer(Arc::new(TracingObserver));

    let run = controller.execute_task(&args.instruction).await?;
    print_run(&run, output)
}
