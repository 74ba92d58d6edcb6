//! Stanza parser for repository index files.
//!
//! The input is a sequence of stanzas separated by blank lines. Each stanza
//! holds `Field: value` lines, and a line starting with whitespace continues
//! the previous field:
//!
//! ```text
//! Package: dplyr
//! Version: 1.1.4
//! Depends: R (>= 3.5.0)
//! Imports: cli (>= 3.4.0), generics, glue (>= 1.3.2),
//!         lifecycle (>= 1.0.3)
//! ```
//!
//! A malformed stanza is dropped and reported as a [`Diagnostic`]; the rest
//! of the buffer is still parsed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rdep_core::error::{RdepError, RdepResult};
use rdep_core::types::{NameAndVersion, Package, Version};

/// Dependency-list fields read when none are configured
pub const DEFAULT_DEPENDENCY_FIELDS: [&str; 3] = ["Depends", "Imports", "LinkingTo"];

/// What to do with a stanza that has no `Version` field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingVersion {
    /// Drop the stanza and record a diagnostic
    #[default]
    Drop,
    /// Accept the stanza with version 0.0.0.0
    AssumeZero,
}

impl FromStr for MissingVersion {
    type Err = RdepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "drop" => Ok(MissingVersion::Drop),
            "assume-zero" => Ok(MissingVersion::AssumeZero),
            other => Err(RdepError::ConfigValidation {
                field: "missing-version".to_string(),
                reason: format!("expected 'drop' or 'assume-zero', got '{}'", other),
            }),
        }
    }
}

/// Parser settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fields whose values are comma-separated dependency lists
    pub dependency_fields: Vec<String>,
    pub missing_version: MissingVersion,
    /// Dependency names left out of every package (e.g. `R` itself)
    pub skip_dependencies: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dependency_fields: DEFAULT_DEPENDENCY_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            missing_version: MissingVersion::default(),
            skip_dependencies: Vec::new(),
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing_version(mut self, policy: MissingVersion) -> Self {
        self.missing_version = policy;
        self
    }

    pub fn dependency_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependency_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn skip_dependency(mut self, name: impl Into<String>) -> Self {
        self.skip_dependencies.push(name.into());
        self
    }

    fn is_dependency_field(&self, field: &str) -> bool {
        self.dependency_fields.iter().any(|f| f == field)
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.skip_dependencies.iter().any(|n| n == name)
    }
}

/// A stanza that was dropped, and why
#[derive(Debug)]
pub struct Diagnostic {
    /// Zero-based position of the stanza in the buffer
    pub stanza: usize,
    /// One-based line number of the stanza's first line
    pub line: usize,
    /// Package name, when the stanza got far enough to have one
    pub package: Option<String>,
    pub error: RdepError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stanza {} (line {}", self.stanza + 1, self.line)?;
        if let Some(ref package) = self.package {
            write!(f, ", package {}", package)?;
        }
        write!(f, "): {}", self.error)
    }
}

/// Everything one parse produced
#[derive(Debug)]
pub struct ParseOutput {
    pub packages: Vec<Package>,
    pub diagnostics: Vec<Diagnostic>,
    pub bytes_consumed: usize,
}

/// Raw lines of one stanza, still borrowed from the input buffer
struct RawStanza<'a> {
    index: usize,
    first_line: usize,
    lines: Vec<&'a [u8]>,
}

struct Field<'a> {
    name: &'a str,
    value: String,
}

/// Parse a whole buffer into packages.
///
/// Fails only when the buffer holds nothing but whitespace; every other
/// problem drops the offending stanza and is reported in
/// [`ParseOutput::diagnostics`].
pub fn parse(buf: &[u8], options: &ParseOptions) -> RdepResult<ParseOutput> {
    if buf.iter().all(u8::is_ascii_whitespace) {
        return Err(RdepError::EmptyInput);
    }

    let stanzas = split_stanzas(buf);
    let mut packages = Vec::with_capacity(stanzas.len());
    let mut diagnostics = Vec::new();

    for stanza in &stanzas {
        match parse_stanza(stanza, options) {
            Ok(package) => packages.push(package),
            Err(diagnostic) => {
                warn!(
                    stanza = diagnostic.stanza + 1,
                    line = diagnostic.line,
                    package = diagnostic.package.as_deref().unwrap_or("<unknown>"),
                    "dropping stanza: {}",
                    diagnostic.error
                );
                diagnostics.push(diagnostic);
            }
        }
    }

    debug!(
        packages = packages.len(),
        dropped = diagnostics.len(),
        bytes = buf.len(),
        "parsed repository buffer"
    );

    Ok(ParseOutput {
        packages,
        diagnostics,
        bytes_consumed: buf.len(),
    })
}

fn split_stanzas(buf: &[u8]) -> Vec<RawStanza<'_>> {
    let mut stanzas = Vec::new();
    let mut current: Vec<&[u8]> = Vec::new();
    let mut first_line = 0;

    for (i, raw) in buf.split(|&b| b == b'\n').enumerate() {
        let line = raw.strip_suffix(b"\r").unwrap_or(raw);

        if line.iter().all(u8::is_ascii_whitespace) {
            if !current.is_empty() {
                stanzas.push(RawStanza {
                    index: stanzas.len(),
                    first_line,
                    lines: std::mem::take(&mut current),
                });
            }
            continue;
        }
        if line.first() == Some(&b'#') {
            continue;
        }

        if current.is_empty() {
            first_line = i + 1;
        }
        current.push(line);
    }

    if !current.is_empty() {
        stanzas.push(RawStanza {
            index: stanzas.len(),
            first_line,
            lines: current,
        });
    }

    stanzas
}

fn parse_stanza(stanza: &RawStanza<'_>, options: &ParseOptions) -> Result<Package, Diagnostic> {
    let diagnostic = |package: Option<String>, error: RdepError| Diagnostic {
        stanza: stanza.index,
        line: stanza.first_line,
        package,
        error,
    };

    let fields = collect_fields(&stanza.lines).map_err(|e| diagnostic(None, e))?;

    build_package(&fields, options).map_err(|e| {
        let package = fields
            .iter()
            .find(|f| f.name == "Package" && !f.value.is_empty())
            .map(|f| f.value.clone());
        diagnostic(package, e)
    })
}

fn collect_fields<'a>(lines: &[&'a [u8]]) -> RdepResult<Vec<Field<'a>>> {
    let mut fields: Vec<Field<'a>> = Vec::new();

    for &raw in lines {
        let line = std::str::from_utf8(raw).map_err(|_| RdepError::InvalidUtf8)?;
        let malformed = || RdepError::MalformedLine {
            line: line.to_string(),
        };

        // Continuation of the previous field
        if line.starts_with([' ', '\t']) {
            let field = fields.last_mut().ok_or_else(malformed)?;
            let text = line.trim();
            if !field.value.is_empty() {
                field.value.push(' ');
            }
            field.value.push_str(text);
            continue;
        }

        let (name, value) = line.split_once(':').ok_or_else(malformed)?;
        let name = name.trim_end();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(malformed());
        }

        fields.push(Field {
            name,
            value: value.trim().to_string(),
        });
    }

    Ok(fields)
}

/// Value of a field that may appear at most once
fn single<'f>(fields: &'f [Field<'_>], name: &str) -> RdepResult<Option<&'f str>> {
    let mut found = fields.iter().filter(|f| f.name == name);
    let first = found.next();
    if found.next().is_some() {
        return Err(RdepError::DuplicateField {
            field: name.to_string(),
        });
    }
    Ok(first.map(|f| f.value.as_str()))
}

fn build_package(fields: &[Field<'_>], options: &ParseOptions) -> RdepResult<Package> {
    let name = single(fields, "Package")?
        .filter(|name| !name.is_empty())
        .ok_or_else(|| RdepError::MissingField {
            field: "Package".to_string(),
        })?;
    if !NameAndVersion::is_valid_name(name) {
        return Err(RdepError::MalformedLine {
            line: format!("Package: {}", name),
        });
    }

    let version = match single(fields, "Version")? {
        Some(text) => text.parse::<Version>()?,
        None => match options.missing_version {
            MissingVersion::AssumeZero => Version::ZERO,
            MissingVersion::Drop => {
                return Err(RdepError::MissingField {
                    field: "Version".to_string(),
                })
            }
        },
    };

    let mut dependencies = Vec::new();
    for field in fields.iter().filter(|f| options.is_dependency_field(f.name)) {
        for entry in field.value.split(',').map(str::trim) {
            // Trailing commas leave empty entries behind
            if entry.is_empty() {
                continue;
            }
            let dependency: NameAndVersion = entry.parse()?;
            if options.is_skipped(&dependency.name) {
                continue;
            }
            dependencies.push(dependency);
        }
    }

    Ok(Package {
        name: name.to_string(),
        version,
        dependencies,
    })
}
