//! Keel command line interface
//!
//! Loads a TOML plan of life-cycle observers and prints or runs the order in
//! which they are started and stopped.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Keel Command Line Interface
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the start and stop order of the observer groups
    Plan,

    /// Start then stop the declared observers, printing each notification
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Plan => commands::plan::execute(&config),
        Commands::Run => commands::run::execute(&config).await,
    }
}
