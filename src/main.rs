//! Sitegraph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "sitegraph")]
#[command(about = "Link graphs for documentation sites, federated across projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph from host events and write all outputs
    Build {
        /// JSON-lines file of host events
        #[arg(short, long)]
        events: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "_static/sitegraph")]
        out: PathBuf,

        /// Worker threads for event ingestion (defaults to all cores)
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Merge configured peers into an existing graph document
    Merge {
        /// Graph document to start from
        #[arg(short, long)]
        graph: PathBuf,

        /// Where to write the merged document
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Print a summary of a graph document
    Inspect {
        #[arg(short, long)]
        graph: PathBuf,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "sitegraph={log_level},sitegraph_core={log_level},sitegraph_federation={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Sitegraph v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Build { events, out, jobs } => {
            let config = config::Config::load(&cli.config)?;
            commands::build(&config, &events, &out, jobs).await
        }
        Commands::Merge { graph, out } => {
            let config = config::Config::load(&cli.config)?;
            commands::merge(&config, &graph, &out).await
        }
        Commands::Inspect { graph } => commands::inspect(&graph),
        Commands::Version => {
            println!("Sitegraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
