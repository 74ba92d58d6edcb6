//! Package records.
//!
//! One `Package` corresponds to one stanza of a repository index file.

use super::{NameAndVersion, Version};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single package version and the references it depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: Version,
    pub dependencies: Vec<NameAndVersion>,
}

impl Package {
    /// Create a package with no dependencies
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency reference
    pub fn with_dependency(mut self, dependency: NameAndVersion) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Check if this package depends on `name`, under any constraint
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d.name == name)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}
