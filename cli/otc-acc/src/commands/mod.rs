//! CLI commands.

mod env;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Inspect the acceptance-test environment.
#[derive(Debug, Parser)]
#[command(name = "otc-acc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the resolved registry, harness settings, and gate outcomes.
    Env(env::EnvCommand),

    /// Render a template file against the registry.
    Render(render::RenderCommand),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Env(cmd) => cmd.run(self.format),
            Commands::Render(cmd) => cmd.run().await,
        }
    }
}
