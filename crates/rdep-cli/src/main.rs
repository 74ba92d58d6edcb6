//! # rdep-cli
//!
//! Checks R-style PACKAGES repositories for dependencies that no package in
//! the repository can satisfy.
//!
//! This is the entry point for the `rdep` tool. It handles command parsing,
//! sets up logging and error handling, and dispatches to the command handlers.

use std::collections::HashMap;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use rdep_core::error::{RdepError, RdepResult};
use tracing::{error, info};

mod commands;
mod output;

use commands::{CommandContext, Outcome};
use output::errors::ErrorFormatter;

/// Find unsatisfied dependencies in an R-style package repository
#[derive(Parser)]
#[command(name = "rdep", version, about = "Unsatisfied-dependency checker for PACKAGES files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository index file (default: PACKAGES)
    #[arg(short = 'p', long = "packages", global = true, value_name = "FILE")]
    pub packages_file: Option<String>,

    /// Accept stanzas without a Version field, as version 0.0.0.0
    #[arg(long, global = true)]
    pub allow_missing_version: bool,

    /// Whether a package is re-checked each time it is referenced
    #[arg(long, global = true, value_name = "POLICY")]
    pub revisit: Option<String>,

    /// Which version of a package the closure walk descends into
    #[arg(long, global = true, value_name = "POLICY")]
    pub select: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report unsatisfied dependencies of packages
    Check {
        /// Packages to check
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        packages: Vec<String>,
        /// Check every package in the repository
        #[arg(long)]
        all: bool,
        /// Show the chain of packages leading to each unsatisfied entry
        #[arg(long)]
        explain: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List every version of a package and its dependencies
    Show { package: String },
    /// Show repository statistics and parse diagnostics
    Stats,
    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl Cli {
    /// Global flags as configuration overrides, keyed like rdep.toml settings
    fn config_overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(ref file) = self.packages_file {
            overrides.insert("packages".to_string(), file.clone());
        }
        if self.allow_missing_version {
            overrides.insert("missing-version".to_string(), "assume-zero".to_string());
        }
        if let Some(ref revisit) = self.revisit {
            overrides.insert("revisit".to_string(), revisit.clone());
        }
        if let Some(ref select) = self.select {
            overrides.insert("select".to_string(), select.clone());
        }
        overrides
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting rdep v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::Problems) => ExitCode::from(1),
        Err(e) => {
            eprint!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::from(2)
        }
    }
}

fn run_cli(cli: Cli) -> RdepResult<Outcome> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| RdepError::io("Failed to create async runtime", e))?;

    rt.block_on(async {
        let ctx = CommandContext::new(cli.config_overrides()).await?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "rdep={level},rdep_core={level},rdep_repo={level},rdep_resolver={level},rdep_config={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("rdep encountered an unexpected error: {}", panic_info);
        eprintln!("rdep crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/rdep-tools/rdep/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
