//! Config command - inspect and create the settings file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use notamon_core::models::config::NotamonConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the settings a run would use
    Show(ShowArgs),

    /// Write a settings file with the defaults
    Init(InitArgs),

    /// Print where the settings file is looked up
    Path,
}

#[derive(Args)]
struct ShowArgs {
    /// Print the raw JSON instead of the resolved summary
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InitArgs {
    /// Where to write the file (default: the -c path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace an existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: &Path) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show(show_args) => show_config(show_args, config_path),
        ConfigCommand::Init(init_args) => init_config(init_args, config_path),
        ConfigCommand::Path => show_path(config_path),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notamon")
        .join("config.json")
}

/// Load the configuration file, `None` when it does not exist.
pub fn load_if_exists(config_path: &Path) -> anyhow::Result<Option<NotamonConfig>> {
    if config_path.exists() {
        Ok(Some(NotamonConfig::from_file(config_path)?))
    } else {
        Ok(None)
    }
}

fn show_config(args: ShowArgs, config_path: &Path) -> anyhow::Result<()> {
    let loaded = load_if_exists(config_path)?;
    let from_file = loaded.is_some();
    let config = loaded.unwrap_or_default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if from_file {
        println!("Settings from {}", config_path.display());
    } else {
        println!(
            "{} {} does not exist, these are the built-in defaults",
            style("ℹ").blue(),
            config_path.display()
        );
    }
    println!();

    let input = &config.paths.pdf_input_dir;
    let input_state = if input.is_dir() {
        style("ok").green()
    } else {
        style("missing").red()
    };
    println!("  notes       {} ({})", input.display(), input_state);

    let history = &config.paths.history_path;
    let is_xlsx = history
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    if is_xlsx {
        println!(
            "  history     {} (sheet \"{}\", alert rows {})",
            history.display(),
            config.excel.sheet_name,
            if config.excel.highlight_alerts { "highlighted" } else { "plain" }
        );
    } else {
        println!("  history     {} (csv)", history.display());
    }

    println!(
        "  backups     {}",
        if config.processing.backup_before_save { "on" } else { "off" }
    );
    println!("  jobs        {}", config.processing.jobs);
    println!("  log level   {}", config.logging.level);

    Ok(())
}

fn init_config(args: InitArgs, config_path: &Path) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| config_path.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to replace it",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = NotamonConfig::default();
    config.save(&output_path)?;

    println!(
        "{} Wrote default settings to {}",
        style("✓").green(),
        output_path.display()
    );
    println!(
        "   notes are read from {}, edit paths.pdf_input_dir to change it",
        config.paths.pdf_input_dir.display()
    );

    Ok(())
}

fn show_path(config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{} {}", config_path.display(), style("(not created yet)").yellow());
        println!("Create it with 'notamon config init'.");
    }

    Ok(())
}
