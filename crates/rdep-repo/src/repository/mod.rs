//! Insertion-ordered package storage
//!
//! A `Repository` exclusively owns the packages parsed from one or more
//! index buffers. Names are not unique: every version of a package found in
//! the input is kept.

use tracing::debug;

use rdep_core::error::RdepResult;
use rdep_core::types::Package;

use crate::parser::{self, Diagnostic, ParseOptions};

/// Owned collection of parsed packages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository {
    packages: Vec<Package>,
}

/// Outcome of reading one buffer into a repository
#[derive(Debug)]
pub struct ReadSummary {
    /// Length of the buffer that was processed
    pub bytes_consumed: usize,
    /// Number of packages appended
    pub packages_added: usize,
    /// Stanzas that were dropped
    pub diagnostics: Vec<Diagnostic>,
}

impl ReadSummary {
    /// True when no stanza was dropped
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl Repository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a package; duplicate names are kept
    pub fn insert(&mut self, package: Package) {
        self.packages.push(package);
    }

    /// Parse `buf` and append every package it holds.
    ///
    /// The repository is only touched once the whole buffer has been parsed,
    /// so an error leaves it exactly as it was. Dropped stanzas do not make
    /// the read fail; they are returned in [`ReadSummary::diagnostics`].
    pub fn read(&mut self, buf: &[u8], options: &ParseOptions) -> RdepResult<ReadSummary> {
        let output = parser::parse(buf, options)?;
        let packages_added = output.packages.len();
        self.packages.extend(output.packages);

        debug!(
            added = packages_added,
            total = self.packages.len(),
            "read packages into repository"
        );

        Ok(ReadSummary {
            bytes_consumed: output.bytes_consumed,
            packages_added,
            diagnostics: output.diagnostics,
        })
    }

    /// All packages called `name`, in insertion order (linear scan)
    pub fn packages_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Package> + 'a {
        self.packages.iter().filter(move |p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Package> {
        self.packages.iter()
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Number of packages, counting every version separately
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl<'a> IntoIterator for &'a Repository {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}

impl FromIterator<Package> for Repository {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().collect(),
        }
    }
}

impl Extend<Package> for Repository {
    fn extend<I: IntoIterator<Item = Package>>(&mut self, iter: I) {
        self.packages.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdep_core::error::RdepError;
    use rdep_core::types::Version;

    #[test]
    fn test_insert_keeps_duplicates() {
        let mut repo = Repository::new();
        repo.insert(Package::new("a", Version::new(1, 0, 0, 0)));
        repo.insert(Package::new("b", Version::new(1, 0, 0, 0)));
        repo.insert(Package::new("a", Version::new(2, 0, 0, 0)));

        assert_eq!(repo.len(), 3);
        let versions: Vec<Version> = repo.packages_named("a").map(|p| p.version).collect();
        assert_eq!(versions, vec![Version::new(1, 0, 0, 0), Version::new(2, 0, 0, 0)]);
        assert_eq!(repo.packages_named("missing").count(), 0);
    }

    #[test]
    fn test_read_appends() {
        let mut repo = Repository::new();
        let first = repo
            .read(b"Package: a\nVersion: 1.0\n", &ParseOptions::default())
            .unwrap();
        assert_eq!(first.packages_added, 1);
        assert!(first.is_clean());

        let second = repo
            .read(
                b"Package: b\nVersion: 1.0\n\nPackage: a\nVersion: 2.0\n",
                &ParseOptions::default(),
            )
            .unwrap();
        assert_eq!(second.packages_added, 2);

        let names: Vec<&str> = repo.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_read_reports_dropped_stanzas() {
        let mut repo = Repository::new();
        let buf = b"Package: a\nVersion: bogus\n\nPackage: b\nVersion: 1.0\n";
        let summary = repo.read(buf, &ParseOptions::default()).unwrap();

        assert_eq!(summary.bytes_consumed, buf.len());
        assert_eq!(summary.packages_added, 1);
        assert!(!summary.is_clean());
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_failed_read_leaves_repository_untouched() {
        let mut repo: Repository = vec![Package::new("a", Version::new(1, 0, 0, 0))]
            .into_iter()
            .collect();
        let before = repo.clone();

        let err = repo.read(b"\n\n", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, RdepError::EmptyInput));
        assert_eq!(repo, before);
    }

    #[test]
    fn test_extend_and_iterate() {
        let mut repo = Repository::new();
        assert!(repo.is_empty());
        repo.extend([
            Package::new("x", Version::new(0, 1, 0, 0)),
            Package::new("y", Version::new(0, 2, 0, 0)),
        ]);
        assert_eq!((&repo).into_iter().count(), 2);
        assert_eq!(repo.packages()[1].name, "y");
    }
}
