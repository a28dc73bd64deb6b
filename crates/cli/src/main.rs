//! mapconf - check and apply object manager configurations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::ApplyPolicy;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "mapconf", version, about = "Check and apply object manager configurations")]
struct Cli {
    /// Log level filter
    #[arg(long, env = "RUST_LOG", default_value = "warn", global = true)]
    log_level: String,

    /// Log format (json, pretty)
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty", global = true)]
    log_format: String,

    /// Override options from environment variables with this prefix
    #[arg(long, env = "MAPCONF_ENV_PREFIX", global = true)]
    env_prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a configuration without applying it
    Check {
        /// Configuration URL or local path
        source: String,
    },
    /// Apply a configuration to a fresh object manager and print its state
    Apply {
        /// Configuration URL or local path
        source: String,
        /// How to handle failing options (fail-fast, best-effort, all-or-nothing)
        #[arg(long, default_value_t = ApplyPolicy::default())]
        policy: ApplyPolicy,
    },
    /// Write an example configuration file
    Example {
        /// Destination path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load .env file if it exists
    let dotenv_result = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format)?;

    match dotenv_result {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(e) if !e.not_found() => warn!("Could not load .env file: {}", e),
        Err(_) => {}
    }

    let loader = commands::loader(cli.env_prefix.as_deref());

    match cli.command {
        Command::Check { source } => commands::check(&loader, &source),
        Command::Apply { source, policy } => commands::apply(&loader, &source, policy),
        Command::Example { path } => config::ConfigurationLoader::create_example(&path)
            .with_context(|| format!("Failed to create example at {}", path.display())),
    }
}

/// Initialize logging on stderr so command output stays machine-readable
fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
    }

    info!(level = log_level, format = log_format, "Logging initialized");
    Ok(())
}
