//! Error types and result aliases for rdep operations.
//!
//! Provides a unified error type that covers the error conditions of
//! parsing, configuration and querying, with actionable error messages.

use crate::types::VersionError;
use thiserror::Error;

/// Unified error type for all rdep operations
#[derive(Error, Debug)]
pub enum RdepError {
    // Input errors
    #[error("Repository buffer is empty")]
    EmptyInput,

    #[error("Invalid version: {0}")]
    Version(#[from] VersionError),

    #[error("Invalid dependency entry '{entry}': {reason}")]
    InvalidDependency { entry: String, reason: String },

    #[error("Stanza is missing the required '{field}' field")]
    MissingField { field: String },

    #[error("Field '{field}' appears more than once in a stanza")]
    DuplicateField { field: String },

    #[error("Malformed line '{line}': expected 'Field: value'")]
    MalformedLine { line: String },

    #[error("Stanza is not valid UTF-8")]
    InvalidUtf8,

    // Query errors
    #[error("Package '{name}' not found in repository")]
    PackageNotFound { name: String },

    // Config errors
    #[error("Failed to parse rdep.toml: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for rdep operations
pub type RdepResult<T> = Result<T, RdepError>;

impl RdepError {
    /// Create an IO error from std::io::Error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Whether this error only invalidates a single stanza
    pub fn is_stanza_local(&self) -> bool {
        matches!(
            self,
            RdepError::Version(_)
                | RdepError::InvalidDependency { .. }
                | RdepError::MissingField { .. }
                | RdepError::DuplicateField { .. }
                | RdepError::MalformedLine { .. }
                | RdepError::InvalidUtf8
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            RdepError::EmptyInput => Some("Check that the PACKAGES file is not empty"),
            RdepError::PackageNotFound { .. } => {
                Some("Check the package name spelling; names are case-sensitive")
            }
            RdepError::MissingField { field } if field == "Version" => {
                Some("Pass --allow-missing-version to accept stanzas without a Version")
            }
            RdepError::TomlParse { .. } | RdepError::ConfigValidation { .. } => {
                Some("Fix rdep.toml or remove it to use the defaults")
            }
            RdepError::Io { .. } => Some("Pass --packages <FILE> to point at the repository index"),
            _ => None,
        }
    }
}
