//! PagePilot command-line entry point.

mod cli;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cli::app::run().await
}
