use clap::Subcommand;

use super::demo::DemoArgs;
use super::run::RunArgs;
use super::schema::SchemaArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run an instruction against the built-in site with a live completion endpoint
    Run(RunArgs),

    /// Drive the built-in site with a scripted model; no network needed
    Demo(DemoArgs),

    /// Print the system prompt and the action vocabulary
    Schema(SchemaArgs),
}
