//! Command implementations and dispatch logic.
//!
//! Each command is an async function taking a [`CommandContext`]; the context
//! owns the merged configuration and knows how to load the repository file.

use std::collections::HashMap;

use camino::Utf8PathBuf;
use rdep_config::{ConfigLayering, ConfigLoader, ConfigSource, RdepToml};
use rdep_core::error::{RdepError, RdepResult};
use rdep_repo::{ReadSummary, Repository};
use tracing::{debug, info};

pub mod check;
pub mod show;
pub mod stats;


use crate::{output::OutputHandler, Commands};

/// How a command finished, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report
    Clean,
    /// Missing packages, unsatisfied dependencies, or dropped stanzas
    Problems,
}

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    pub config: RdepToml,
    pub sources: Vec<ConfigSource>,
}

impl CommandContext {
    /// Load configuration for the current directory, with `cli_overrides`
    /// applied on top of files and environment
    pub async fn new(cli_overrides: HashMap<String, String>) -> RdepResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| RdepError::io("Failed to get current directory", e))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
            RdepError::io("Current directory is not valid UTF-8", e.into_io_error())
        })?;

        let loader = ConfigLoader::new(cwd.clone());
        let (config, sources) = loader
            .load(ConfigLayering::collect_env_overrides(), cli_overrides)
            .await?;

        Ok(Self::with_config(cwd, config, sources))
    }

    pub fn with_config(cwd: Utf8PathBuf, config: RdepToml, sources: Vec<ConfigSource>) -> Self {
        Self {
            cwd,
            output: OutputHandler::new(),
            config,
            sources,
        }
    }

    /// Repository file, relative paths taken from the working directory
    pub fn packages_file(&self) -> Utf8PathBuf {
        self.cwd.join(self.config.packages_path())
    }

    /// Read and parse the repository file, warning when stanzas were dropped
    pub async fn load_repository(&self) -> RdepResult<(Repository, ReadSummary)> {
        let path = self.packages_file();
        debug!(path = %path, "reading repository file");

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| RdepError::io(format!("Failed to read {}", path), e))?;

        let mut repository = Repository::new();
        let summary = match repository.read(&bytes, &self.config.parse_options()) {
            Ok(summary) => summary,
            // An empty file still yields an (empty) index; every lookup then misses
            Err(RdepError::EmptyInput) => {
                self.output
                    .warn(&format!("Failed to read repo: {} has no stanzas", path));
                ReadSummary {
                    bytes_consumed: 0,
                    packages_added: 0,
                    diagnostics: Vec::new(),
                }
            }
            Err(e) => return Err(e),
        };

        if !summary.is_clean() {
            self.output.warn(&format!(
                "{} stanza(s) dropped from {}; run 'rdep stats' for details",
                summary.diagnostics.len(),
                path
            ));
        }

        Ok((repository, summary))
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> RdepResult<Outcome> {
    for source in &ctx.sources {
        debug!(path = %source.path(), "using configuration");
    }

    match command {
        Commands::Check {
            packages,
            all,
            explain,
            format,
        } => {
            info!("Checking {} package(s) (all: {})", packages.len(), all);
            check::execute(packages, all, explain, format, ctx).await
        }
        Commands::Show { package } => {
            info!("Showing package: {}", package);
            show::execute(package, ctx).await
        }
        Commands::Stats => {
            info!("Showing repository statistics");
            stats::execute(ctx).await
        }
        Commands::Version => {
            info!("Showing version information");
            show_version(ctx).await
        }
    }
}

async fn show_version(ctx: &CommandContext) -> RdepResult<Outcome> {
    let version = env!("CARGO_PKG_VERSION");
    let build_date = env!("BUILD_DATE");
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.info(&format!("rdep v{}", version));
    ctx.output.info(&format!("Built: {}", build_date));
    ctx.output.info(&format!("Target: {}", target));
    ctx.output.info(&format!("Rust: {}", env!("RUSTC_VERSION")));

    Ok(Outcome::Clean)
}
