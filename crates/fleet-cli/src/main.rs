//! fleetctl - Command-line interface for fleet group reconciliation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet_core::{Config, LoggingConfig};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use output::{OutputFormat, OutputFormatter};

/// Command-line interface for fleet group reconciliation
#[derive(Debug, Parser)]
#[command(name = "fleetctl")]
#[command(about = "Declarative management of cloud instance groups")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level or filter directive (overrides the configuration)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a group spec without touching the provider
    Validate {
        /// Group spec file (JSON or YAML)
        spec: PathBuf,
    },

    /// Commit group specs against the simulated provider
    Apply {
        /// Group spec files (JSON or YAML), committed in order
        #[arg(required = true)]
        specs: Vec<PathBuf>,

        /// Only report what would change
        #[arg(long)]
        pretend: bool,

        /// Tear every committed group down afterwards
        #[arg(long)]
        destroy: bool,
    },

    /// Print the default configuration
    Config {
        /// Write to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.output);

    if let Err(e) = run(cli, &formatter).await {
        formatter.print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let mut config = load_config(cli.config.as_ref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging)?;
    debug!("using provider {}/{}", config.provider.project, config.provider.zone);

    match cli.command {
        Commands::Validate { spec } => commands::validate::execute(&config, &spec, formatter).await,
        Commands::Apply {
            specs,
            pretend,
            destroy,
        } => commands::apply::execute(&config, &specs, pretend, destroy, formatter).await,
        Commands::Config { output } => commands::config::execute(output, formatter),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::load().context("Failed to load configuration"),
    }
}

fn init_logging(logging_config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging_config.level))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(logging_config.show_target)
        .with_thread_ids(logging_config.show_thread_ids)
        .with_line_number(logging_config.show_line_numbers);

    match logging_config.format.as_str() {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }

    Ok(())
}
