use anyhow::Result;
use clap::Args;

use pagepilot_task_core::SYSTEM_PROMPT;

#[derive(Args, Clone, Debug)]
pub struct SchemaArgs {
    /// Print only the action vocabulary
    #[arg(long)]
    pub actions: bool,
}

/// Print the system prompt the planner sends, so endpoint operators
/// can see exactly what their model is asked to produce.
pub fn cmd_schema(args: SchemaArgs) -> Result<()> {
    if args.actions {
        if let Some((_, rest)) = SYSTEM_PROMPT.split_once("Actions:") {
            let vocabulary = rest.split("Strategy:").next().unwrap_or(rest);
            println!("Actions:{}", vocabulary.trim_end());
            return Ok(());
        }
    }
    println!("{SYSTEM_PROMPT}");
    Ok(())
}
