//! Dependency references.
//!
//! A `NameAndVersion` is a package name with an optional constraint, as it
//! appears in a `Depends:` list (`Rcpp (>= 1.0.0)`) or as a query root.

use super::VersionConstraint;
use crate::error::RdepError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Package name plus optional version constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameAndVersion {
    pub name: String,
    /// `None` means any version is acceptable
    pub constraint: Option<VersionConstraint>,
}

impl NameAndVersion {
    /// Create an unconstrained reference
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    /// Create a constrained reference
    pub fn constrained(name: impl Into<String>, constraint: VersionConstraint) -> Self {
        Self {
            name: name.into(),
            constraint: Some(constraint),
        }
    }

    pub fn is_constrained(&self) -> bool {
        self.constraint.is_some()
    }

    /// Check if a package name is acceptable in a dependency entry
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && !name
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | ','))
    }
}

impl FromStr for NameAndVersion {
    type Err = RdepError;

    /// Parse a single entry: `name` or `name (op version)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entry = s.trim();
        let invalid = |reason: &str| RdepError::InvalidDependency {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let (name, constraint) = match entry.split_once('(') {
            Some((name, rest)) => {
                let inner = rest
                    .trim_end()
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("missing closing parenthesis"))?;
                let constraint = inner
                    .parse::<VersionConstraint>()
                    .map_err(|e| invalid(&e.to_string()))?;
                (name.trim(), Some(constraint))
            }
            None => (entry, None),
        };

        if name.is_empty() {
            return Err(invalid("empty package name"));
        }
        if !Self::is_valid_name(name) {
            return Err(invalid("package name contains whitespace or punctuation"));
        }

        Ok(Self {
            name: name.to_string(),
            constraint,
        })
    }
}

impl fmt::Display for NameAndVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(constraint) => write!(f, "{} ({})", self.name, constraint),
            None => f.write_str(&self.name),
        }
    }
}
