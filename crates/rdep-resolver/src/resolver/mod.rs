//! Unsatisfied-dependency resolution
//!
//! Starting from one or more root references, the resolver walks the
//! dependency graph implied by an [`Index`] breadth-first and collects every
//! reference that no package can satisfy. Each name is expanded at most
//! once, which bounds the walk by the number of distinct names and makes
//! cyclic dependencies harmless.

use std::collections::{HashSet, VecDeque};
use std::str::FromStr;

use indexmap::IndexSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rdep_core::error::RdepError;
use rdep_core::types::{NameAndVersion, NameVersionBuffer};

use crate::graph::{ClosureEdge, ClosureGraph};
use crate::index::{HighestMatching, Index, SelectionPolicy};

/// How a reference to an already expanded name is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevisitPolicy {
    /// Evaluate the reference's own constraint; only re-expansion is skipped
    #[default]
    Independent,
    /// Skip the reference entirely once its name has been expanded
    SkipVisited,
}

impl FromStr for RevisitPolicy {
    type Err = RdepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "independent" => Ok(RevisitPolicy::Independent),
            "skip-visited" => Ok(RevisitPolicy::SkipVisited),
            other => Err(RdepError::ConfigValidation {
                field: "revisit".to_string(),
                reason: format!("expected 'independent' or 'skip-visited', got '{}'", other),
            }),
        }
    }
}

/// Result of one query: the unsatisfied references in discovery order,
/// plus the traversal that found them
#[derive(Debug, Clone)]
pub struct Resolution {
    unsatisfied: IndexSet<NameAndVersion>,
    graph: ClosureGraph,
    expanded: usize,
}

impl Resolution {
    pub fn iter(&self) -> indexmap::set::Iter<'_, NameAndVersion> {
        self.unsatisfied.iter()
    }

    pub fn len(&self) -> usize {
        self.unsatisfied.len()
    }

    /// True when every reference in the closure was satisfied
    pub fn is_empty(&self) -> bool {
        self.unsatisfied.is_empty()
    }

    pub fn contains(&self, entry: &NameAndVersion) -> bool {
        self.unsatisfied.contains(entry)
    }

    pub fn graph(&self) -> &ClosureGraph {
        &self.graph
    }

    /// Number of packages whose dependency lists were followed
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Chain of package names through which `entry` was required
    pub fn explain(&self, entry: &NameAndVersion) -> Option<Vec<&str>> {
        self.graph.explain(entry)
    }

    pub fn to_buffer(&self) -> NameVersionBuffer {
        self.unsatisfied.iter().cloned().collect()
    }

    pub fn into_buffer(self) -> NameVersionBuffer {
        self.unsatisfied.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Resolution {
    type Item = &'a NameAndVersion;
    type IntoIter = indexmap::set::Iter<'a, NameAndVersion>;

    fn into_iter(self) -> Self::IntoIter {
        self.unsatisfied.iter()
    }
}

/// Outcome of checking one package by name
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub name: String,
    /// `None` when the package is not in the index
    pub resolution: Option<Resolution>,
}

impl CheckReport {
    pub fn is_found(&self) -> bool {
        self.resolution.is_some()
    }

    /// Found, with nothing unsatisfied
    pub fn is_satisfied(&self) -> bool {
        matches!(&self.resolution, Some(resolution) if resolution.is_empty())
    }
}

/// Closure walker over a borrowed index
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'i, 'repo, P: SelectionPolicy = HighestMatching> {
    index: &'i Index<'repo, P>,
    revisit: RevisitPolicy,
}

impl<'i, 'repo, P: SelectionPolicy> Resolver<'i, 'repo, P> {
    pub fn new(index: &'i Index<'repo, P>) -> Self {
        Self {
            index,
            revisit: RevisitPolicy::default(),
        }
    }

    pub fn with_revisit(mut self, revisit: RevisitPolicy) -> Self {
        self.revisit = revisit;
        self
    }

    pub fn index(&self) -> &'i Index<'repo, P> {
        self.index
    }

    pub fn revisit(&self) -> RevisitPolicy {
        self.revisit
    }

    /// Unsatisfied references reachable from the package called `name`.
    ///
    /// Returns `None` when no package of that name exists, which is
    /// different from `Some` of an empty resolution.
    pub fn unsatisfied(&self, name: &str) -> Option<Resolution> {
        if !self.index.contains(name) {
            debug!(package = name, "root package not found");
            return None;
        }
        let root = NameAndVersion::any(name);
        Some(self.resolve(std::slice::from_ref(&root)))
    }

    /// Union of the closures of several roots, walked with one shared
    /// visited-set. A root that cannot be satisfied is itself reported.
    pub fn unsatisfied_batch(&self, roots: &[NameAndVersion]) -> Resolution {
        self.resolve(roots)
    }

    /// One independent query per name, run in parallel; reports come back
    /// in input order
    pub fn check_each<S>(&self, names: &[S]) -> Vec<CheckReport>
    where
        S: AsRef<str> + Sync,
    {
        names
            .par_iter()
            .map(|name| CheckReport {
                name: name.as_ref().to_string(),
                resolution: self.unsatisfied(name.as_ref()),
            })
            .collect()
    }

    fn resolve(&self, roots: &[NameAndVersion]) -> Resolution {
        let mut graph = ClosureGraph::new();
        let mut unsatisfied = IndexSet::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut expanded = 0;

        let mut queue: VecDeque<_> = roots.iter().map(|root| (None, root)).collect();
        for root in roots {
            graph.add_root(&root.name);
        }

        while let Some((parent, reference)) = queue.pop_front() {
            let target = graph.node(&reference.name);

            if self.revisit == RevisitPolicy::SkipVisited
                && visited.contains(reference.name.as_str())
            {
                // Covered by the earlier expansion of the same name
                if let Some(parent) = parent {
                    graph.add_reference(
                        parent,
                        target,
                        ClosureEdge {
                            constraint: reference.constraint,
                            satisfied: true,
                        },
                    );
                }
                continue;
            }

            let matched = self
                .index
                .best_match(&reference.name, reference.constraint.as_ref());
            if let Some(parent) = parent {
                graph.add_reference(
                    parent,
                    target,
                    ClosureEdge {
                        constraint: reference.constraint,
                        satisfied: matched.is_some(),
                    },
                );
            }

            match matched {
                None => {
                    unsatisfied.insert(reference.clone());
                }
                Some(package) => {
                    if visited.insert(package.name.as_str()) {
                        expanded += 1;
                        graph.mark_expanded(target, package.version);
                        queue.extend(package.dependencies.iter().map(|dep| (Some(target), dep)));
                    }
                }
            }
        }

        debug!(
            roots = roots.len(),
            expanded,
            unsatisfied = unsatisfied.len(),
            "resolved closure"
        );

        Resolution {
            unsatisfied,
            graph,
            expanded,
        }
    }
}
