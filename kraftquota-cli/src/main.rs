// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! kraftquota CLI - KraftCloud resource quotas from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Show quotas for the default metro
//! kraftquota quotas
//!
//! # Only the limits, as a table
//! kraftquota quotas --limits -o table
//!
//! # Only the features, as JSON, for a specific metro
//! kraftquota --metro fra0 q --features -o json
//!
//! # Store a token and a default metro
//! kraftquota config set-token <token>
//! kraftquota config set-metro fra0
//! ```

mod commands;
mod output;

use std::io::IsTerminal;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, quotas};

// ============================================================================
// CLI Definition
// ============================================================================

/// kraftquota CLI - KraftCloud resource quotas.
#[derive(Parser)]
#[command(name = "kraftquota")]
#[command(about = "View KraftCloud resource quotas")]
#[command(long_about = r#"
kraftquota shows the resource quotas of a KraftCloud account: current usage
against hard caps, per-resource limits, and enabled features.

The metro is taken from --metro, then KRAFTCLOUD_METRO, then the configured
default. The token is taken from --token, then KRAFTCLOUD_TOKEN, then the
system keychain.

Examples:
  kraftquota quotas                     # Full report
  kraftquota q --limits -o table        # Limits only
  kraftquota q --features -o json       # Features only
  kraftquota config set-metro fra0      # Default metro
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'quotas' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Metro to query, e.g. fra0.
    #[arg(long, global = true)]
    pub metro: Option<String>,

    /// API token.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Colors apply when enabled in settings, not disabled by flag, and
    /// stdout is a terminal.
    pub fn use_colors(&self, enabled_in_settings: bool) -> bool {
        enabled_in_settings && !self.no_color && std::io::stdout().is_terminal()
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show account quotas (default if no command specified).
    #[command(visible_aliases = ["q", "quota"])]
    Quotas(quotas::QuotasArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("kraftquota=debug")
    } else {
        EnvFilter::new("kraftquota=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Quotas(args)) => quotas::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        None => quotas::run(&quotas::QuotasArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
