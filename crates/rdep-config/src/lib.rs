//! Configuration parsing for rdep
//!
//! This crate handles parsing and validation of rdep.toml files and the
//! layering of global, project, environment and command-line settings.

pub mod merge;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use toml::{ParserSection, RdepToml, RepositorySection, ResolverSection};

use rdep_core::error::RdepError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, RdepError>;
