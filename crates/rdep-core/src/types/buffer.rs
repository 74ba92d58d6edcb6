//! Owned sequences of dependency references.
//!
//! Batch queries take their roots from a `NameVersionBuffer`, and resolution
//! results can be handed out as one. The buffer is released when dropped.

use super::NameAndVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Ordered, owned sequence of `NameAndVersion` entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameVersionBuffer {
    entries: Vec<NameAndVersion>,
}

impl NameVersionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: NameAndVersion) {
        self.entries.push(entry);
    }

    pub fn as_slice(&self) -> &[NameAndVersion] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<NameAndVersion> {
        self.entries
    }
}

impl Deref for NameVersionBuffer {
    type Target = [NameAndVersion];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl From<Vec<NameAndVersion>> for NameVersionBuffer {
    fn from(entries: Vec<NameAndVersion>) -> Self {
        Self { entries }
    }
}

impl FromIterator<NameAndVersion> for NameVersionBuffer {
    fn from_iter<I: IntoIterator<Item = NameAndVersion>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for NameVersionBuffer {
    type Item = NameAndVersion;
    type IntoIter = std::vec::IntoIter<NameAndVersion>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a NameVersionBuffer {
    type Item = &'a NameAndVersion;
    type IntoIter = std::slice::Iter<'a, NameAndVersion>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// One entry per line, indented, the way the check command reports them
impl fmt::Display for NameVersionBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "  {}", entry)?;
        }
        Ok(())
    }
}
