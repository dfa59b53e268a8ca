use std::time::Duration;

use anyhow::Result;
use clap::ValueEnum;
use serde_json::json;

use pagepilot_task_core::TaskRun;

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

pub fn print_run(run: &TaskRun, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let payload = json!({
                "report": run.report,
                "task": run.task,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Human => {
            let elapsed =
                humantime::format_duration(Duration::from_millis(run.report.execution_time_ms));
            let verdict = if run.report.success { "completed" } else { "failed" };
            println!(
                "task {} {} after {} steps in {}",
                run.task.id,
                verdict,
                run.task.steps.len(),
                elapsed
            );
            for (index, step) in run.task.steps.iter().enumerate() {
                let status = match &step.error {
                    Some(error) => format!("failed: {error}"),
                    None => format!("{:?}", step.status).to_lowercase(),
                };
                println!(
                    "  {:>2}. {:<24} {:<40} {}",
                    index + 1,
                    step.kind().as_str(),
                    step.request.description,
                    status
                );
            }
            if let Some(error) = &run.report.error {
                println!("error: {error}");
            }
            if let Some(data) = &run.report.data {
                println!("result:\n{}", serde_json::to_string_pretty(data)?);
            }
        }
    }
    Ok(())
}
