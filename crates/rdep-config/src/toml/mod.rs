//! rdep.toml configuration parsing and serialization

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::ConfigResult;
use rdep_core::error::RdepError;
use rdep_core::types::NameAndVersion;
use rdep_repo::{MissingVersion, ParseOptions};
use rdep_resolver::{RevisitPolicy, Selection};

/// Repository file read when nothing else is configured
pub const DEFAULT_PACKAGES_FILE: &str = "PACKAGES";

/// Complete rdep.toml configuration
///
/// Every setting is optional so that layers can be merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RdepToml {
    #[serde(default)]
    pub repository: RepositorySection,

    #[serde(default)]
    pub parser: ParserSection,

    #[serde(default)]
    pub resolver: ResolverSection,
}

/// Where the repository index lives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositorySection {
    /// Path to the index file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<String>,
}

/// How stanzas are read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserSection {
    /// Fields holding comma-separated dependency lists
    #[serde(
        default,
        rename = "dependency-fields",
        skip_serializing_if = "Option::is_none"
    )]
    pub dependency_fields: Option<Vec<String>>,

    /// Policy for stanzas without a Version field
    #[serde(
        default,
        rename = "missing-version",
        skip_serializing_if = "Option::is_none"
    )]
    pub missing_version: Option<MissingVersion>,

    /// Dependency names to leave out entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<Vec<String>>,
}

/// How closures are walked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revisit: Option<RevisitPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Selection>,
}

impl RdepToml {
    /// Path of the repository index file
    pub fn packages_path(&self) -> &str {
        self.repository
            .packages
            .as_deref()
            .unwrap_or(DEFAULT_PACKAGES_FILE)
    }

    /// Parser settings, with defaults for anything unset
    pub fn parse_options(&self) -> ParseOptions {
        let mut options = ParseOptions::new();
        if let Some(ref fields) = self.parser.dependency_fields {
            options = options.dependency_fields(fields.iter().cloned());
        }
        if let Some(policy) = self.parser.missing_version {
            options = options.missing_version(policy);
        }
        for name in self.parser.skip.iter().flatten() {
            options = options.skip_dependency(name.clone());
        }
        options
    }

    pub fn revisit_policy(&self) -> RevisitPolicy {
        self.resolver.revisit.unwrap_or_default()
    }

    pub fn selection(&self) -> Selection {
        self.resolver.select.unwrap_or_default()
    }

    /// Overlay every setting that `other` defines onto `self`
    pub fn overlay(&mut self, other: RdepToml) {
        if other.repository.packages.is_some() {
            self.repository.packages = other.repository.packages;
        }
        if other.parser.dependency_fields.is_some() {
            self.parser.dependency_fields = other.parser.dependency_fields;
        }
        if other.parser.missing_version.is_some() {
            self.parser.missing_version = other.parser.missing_version;
        }
        if other.parser.skip.is_some() {
            self.parser.skip = other.parser.skip;
        }
        if other.resolver.revisit.is_some() {
            self.resolver.revisit = other.resolver.revisit;
        }
        if other.resolver.select.is_some() {
            self.resolver.select = other.resolver.select;
        }
    }
}

/// Parse TOML string to RdepToml configuration
pub fn parse_rdep_toml(content: &str) -> ConfigResult<RdepToml> {
    // toml_edit first, for syntax errors with a precise location
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| toml_error(content, e.message(), e.span()))?;

    let config: RdepToml =
        toml::from_str(content).map_err(|e| toml_error(content, e.message(), e.span()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize RdepToml to TOML string
pub fn serialize_rdep_toml(config: &RdepToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| RdepError::ConfigValidation {
        field: "config".to_string(),
        reason: format!("TOML serialization error: {}", e),
    })
}

/// Validate values serde cannot check on its own
pub fn validate_config(config: &RdepToml) -> ConfigResult<()> {
    if let Some(ref packages) = config.repository.packages {
        if packages.trim().is_empty() {
            return Err(invalid("repository.packages", "path must not be empty"));
        }
    }

    if let Some(ref fields) = config.parser.dependency_fields {
        for field in fields {
            if field.is_empty() || field.contains(|c: char| c.is_whitespace() || c == ':') {
                return Err(invalid(
                    "parser.dependency-fields",
                    format!("'{}' is not a valid field name", field),
                ));
            }
        }
    }

    for name in config.parser.skip.iter().flatten() {
        if !NameAndVersion::is_valid_name(name) {
            return Err(invalid(
                "parser.skip",
                format!("'{}' is not a valid package name", name),
            ));
        }
    }

    Ok(())
}

/// Load and parse rdep.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<RdepToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RdepError::io(format!("Failed to read {}", path), e))?;

    parse_rdep_toml(&content).map_err(|e| match e {
        RdepError::ConfigValidation { field, reason } => RdepError::ConfigValidation {
            field,
            reason: format!("{} (in {})", reason, path),
        },
        RdepError::TomlParse {
            message,
            line,
            column,
        } => RdepError::TomlParse {
            message: format!("{} (in {})", message, path),
            line,
            column,
        },
        other => other,
    })
}

fn invalid(field: &str, reason: impl Into<String>) -> RdepError {
    RdepError::ConfigValidation {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn toml_error(content: &str, message: &str, span: Option<Range<usize>>) -> RdepError {
    let (line, column) = span.map_or((1, 1), |span| locate(content, span.start));
    RdepError::TomlParse {
        message: message.trim().to_string(),
        line,
        column,
    }
}

/// One-based line and column of a byte offset
fn locate(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = &content.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    (line, offset - line_start + 1)
}
