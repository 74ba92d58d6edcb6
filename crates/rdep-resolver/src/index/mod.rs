//! Name-keyed package index and version selection
//!
//! The index is built once from a [`Repository`] and groups every package by
//! name, versions sorted in descending order. Which of several matching
//! versions a query picks is decided by a [`SelectionPolicy`].

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rdep_core::error::RdepError;
use rdep_core::types::{Package, VersionConstraint};
use rdep_repo::Repository;

/// Picks one package out of the versions available under a name
pub trait SelectionPolicy: Send + Sync {
    /// `candidates` are sorted by version, highest first
    fn select<'r>(
        &self,
        candidates: &[&'r Package],
        constraint: Option<&VersionConstraint>,
    ) -> Option<&'r Package>;
}

/// Highest version satisfying the constraint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighestMatching;

/// Lowest version satisfying the constraint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LowestMatching;

impl SelectionPolicy for HighestMatching {
    fn select<'r>(
        &self,
        candidates: &[&'r Package],
        constraint: Option<&VersionConstraint>,
    ) -> Option<&'r Package> {
        candidates
            .iter()
            .find(|p| p.version.satisfies_opt(constraint))
            .copied()
    }
}

impl SelectionPolicy for LowestMatching {
    fn select<'r>(
        &self,
        candidates: &[&'r Package],
        constraint: Option<&VersionConstraint>,
    ) -> Option<&'r Package> {
        candidates
            .iter()
            .rev()
            .find(|p| p.version.satisfies_opt(constraint))
            .copied()
    }
}

/// Selection policy chosen at runtime, e.g. from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    #[default]
    Highest,
    Lowest,
}

impl SelectionPolicy for Selection {
    fn select<'r>(
        &self,
        candidates: &[&'r Package],
        constraint: Option<&VersionConstraint>,
    ) -> Option<&'r Package> {
        match self {
            Selection::Highest => HighestMatching.select(candidates, constraint),
            Selection::Lowest => LowestMatching.select(candidates, constraint),
        }
    }
}

impl FromStr for Selection {
    type Err = RdepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "highest" => Ok(Selection::Highest),
            "lowest" => Ok(Selection::Lowest),
            other => Err(RdepError::ConfigValidation {
                field: "select".to_string(),
                reason: format!("expected 'highest' or 'lowest', got '{}'", other),
            }),
        }
    }
}

/// Read-only snapshot of a repository, grouped by package name.
///
/// The index borrows the packages it was built from, so the repository can
/// neither be dropped nor mutated while the index is alive.
#[derive(Debug, Clone)]
pub struct Index<'repo, P: SelectionPolicy = HighestMatching> {
    /// Name -> packages of that name, highest version first
    by_name: IndexMap<&'repo str, Vec<&'repo Package>>,
    package_count: usize,
    policy: P,
}

impl<'repo> Index<'repo> {
    /// Build an index that prefers the highest matching version
    pub fn build(repository: &'repo Repository) -> Self {
        Self::with_policy(repository, HighestMatching)
    }
}

impl<'repo, P: SelectionPolicy> Index<'repo, P> {
    /// Build an index with an explicit selection policy
    pub fn with_policy(repository: &'repo Repository, policy: P) -> Self {
        let mut by_name: IndexMap<&'repo str, Vec<&'repo Package>> = IndexMap::new();
        for package in repository {
            by_name.entry(package.name.as_str()).or_default().push(package);
        }
        // Stable sort: equal versions keep repository order
        for versions in by_name.values_mut() {
            versions.sort_by(|a, b| b.version.cmp(&a.version));
        }

        debug!(
            names = by_name.len(),
            packages = repository.len(),
            "built package index"
        );

        Self {
            by_name,
            package_count: repository.len(),
            policy,
        }
    }

    /// Every package called `name`, highest version first
    pub fn versions(&self, name: &str) -> &[&'repo Package] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Whether any package under `name` satisfies `constraint`
    pub fn satisfies(&self, name: &str, constraint: Option<&VersionConstraint>) -> bool {
        self.versions(name)
            .iter()
            .any(|p| p.version.satisfies_opt(constraint))
    }

    /// The package the selection policy picks for `name` under `constraint`
    pub fn best_match(
        &self,
        name: &str,
        constraint: Option<&VersionConstraint>,
    ) -> Option<&'repo Package> {
        self.policy.select(self.versions(name), constraint)
    }

    /// Distinct package names, in order of first appearance
    pub fn names(&self) -> impl Iterator<Item = &'repo str> + '_ {
        self.by_name.keys().copied()
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Number of packages indexed, counting every version
    pub fn package_count(&self) -> usize {
        self.package_count
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}
