//! Iris CLI - Command-line interface for registry sync cleanup.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("iris=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "iris=info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Cleanup(args) => commands::cleanup::run(&args).await,
        Commands::Plan(args) => commands::plan::run(&args).await,
        Commands::Select(args) => commands::select::run(&args),
        Commands::Tags(args) => commands::tags::run(&args),
        Commands::Version => {
            println!("iris {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
