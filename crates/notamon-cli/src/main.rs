//! CLI application for brokerage note extraction and compliance monitoring.

mod commands;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, extract, run};

/// Brokerage note monitor - Extract trades from settlement notes and flag risky operations
#[derive(Parser)]
#[command(name = "notamon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, classify and merge every note in the input directory
    Run(run::RunArgs),

    /// Extract and classify matching PDF files without touching the history
    Extract(extract::ExtractArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

/// Log level from the `-v` count, falling back to the configured level.
fn log_level(verbose: u8, config_path: &std::path::Path) -> Level {
    match verbose {
        0 => config::load_if_exists(config_path)
            .ok()
            .flatten()
            .and_then(|c| Level::from_str(&c.logging.level).ok())
            .unwrap_or(Level::INFO),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(cli.verbose, &config_path))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Run(args) => run::run(args, &config_path).await,
        Commands::Extract(args) => extract::run(args).await,
        Commands::Config(args) => config::run(args, &config_path).await,
    }
}
