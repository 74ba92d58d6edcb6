//! Closure graph recorded during resolution, using petgraph
//!
//! Nodes are package names, edges are the dependency references followed
//! from one package to another. The graph answers "how was this reached"
//! and "where are the cycles" after a query has finished.

use std::collections::HashMap;

use petgraph::algo::{astar, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeFiltered, EdgeRef};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use rdep_core::types::{NameAndVersion, Version, VersionConstraint};

/// A package name reached by the traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureNode {
    pub name: String,
    /// Version whose dependencies were followed; `None` if never expanded
    pub version: Option<Version>,
}

/// A dependency reference between two names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureEdge {
    pub constraint: Option<VersionConstraint>,
    /// Whether some package satisfied the reference
    pub satisfied: bool,
}

/// Directed graph of one resolution's traversal
#[derive(Debug, Clone, Default)]
pub struct ClosureGraph {
    graph: DiGraph<ClosureNode, ClosureEdge>,
    /// Map from package name to NodeIndex for fast lookups
    node_map: HashMap<String, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl ClosureGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node for `name`, created on first use
    pub fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            return index;
        }
        let index = self.graph.add_node(ClosureNode {
            name: name.to_string(),
            version: None,
        });
        self.node_map.insert(name.to_string(), index);
        index
    }

    /// Node for a query root
    pub fn add_root(&mut self, name: &str) -> NodeIndex {
        let index = self.node(name);
        if !self.roots.contains(&index) {
            self.roots.push(index);
        }
        index
    }

    /// Record the version whose dependencies were followed
    pub fn mark_expanded(&mut self, node: NodeIndex, version: Version) {
        if let Some(weight) = self.graph.node_weight_mut(node) {
            weight.version = Some(version);
        }
    }

    /// Add a reference edge, ignoring exact duplicates
    pub fn add_reference(&mut self, from: NodeIndex, to: NodeIndex, edge: ClosureEdge) {
        let exists = self
            .graph
            .edges_connecting(from, to)
            .any(|e| e.weight() == &edge);
        if !exists {
            self.graph.add_edge(from, to, edge);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ClosureNode> {
        let index = self.node_map.get(name)?;
        self.graph.node_weight(*index)
    }

    pub fn roots(&self) -> impl Iterator<Item = &ClosureNode> {
        self.roots.iter().map(|&index| &self.graph[index])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ClosureNode> {
        self.graph.node_weights()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Shortest chain of names from any root to `name`
    pub fn path_to(&self, name: &str) -> Option<Vec<&str>> {
        let target = *self.node_map.get(name)?;
        self.path_to_node(target).map(|path| self.names(&path))
    }

    /// Chain of names leading to an unsatisfied reference, ending with the
    /// missing name itself.
    ///
    /// A root that could not be satisfied explains itself.
    pub fn explain(&self, entry: &NameAndVersion) -> Option<Vec<&str>> {
        let target = *self.node_map.get(&entry.name)?;

        let via = self
            .graph
            .edges_directed(target, Direction::Incoming)
            .filter(|e| !e.weight().satisfied && e.weight().constraint == entry.constraint)
            .filter_map(|e| self.path_to_node(e.source()))
            .min_by_key(Vec::len);

        match via {
            Some(mut path) => {
                path.push(target);
                Some(self.names(&path))
            }
            None if self.roots.contains(&target) => Some(vec![self.graph[target].name.as_str()]),
            None => None,
        }
    }

    /// Strongly connected components that form a cycle: more than one
    /// member, or a single member depending on itself
    pub fn cycles(&self) -> Vec<Vec<&str>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| match scc.as_slice() {
                [single] => self.graph.find_edge(*single, *single).is_some(),
                members => members.len() > 1,
            })
            .map(|scc| self.names(&scc))
            .collect()
    }

    /// Format cycle as "a -> b -> c -> a"
    pub fn format_cycle(cycle: &[&str]) -> String {
        match cycle.first() {
            None => "No cycle".to_string(),
            Some(&first) => {
                let mut closed = cycle.to_vec();
                closed.push(first);
                closed.join(" -> ")
            }
        }
    }

    /// Shortest root-to-`target` chain over satisfied references only
    fn path_to_node(&self, target: NodeIndex) -> Option<Vec<NodeIndex>> {
        let expanded = EdgeFiltered::from_fn(&self.graph, |e| e.weight().satisfied);
        self.roots
            .iter()
            .filter_map(|&root| {
                astar(&expanded, root, |n| n == target, |_| 1usize, |_| 0)
                    .map(|(_, path)| path)
            })
            .min_by_key(Vec::len)
    }

    fn names(&self, path: &[NodeIndex]) -> Vec<&str> {
        path.iter()
            .map(|&index| self.graph[index].name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdep_core::types::Op;

    fn any_edge() -> ClosureEdge {
        ClosureEdge {
            constraint: None,
            satisfied: true,
        }
    }

    /// Builds a graph from `(from, to)` name pairs with satisfied edges
    fn graph_of(roots: &[&str], edges: &[(&str, &str)]) -> ClosureGraph {
        let mut graph = ClosureGraph::new();
        for root in roots {
            graph.add_root(root);
        }
        for (from, to) in edges {
            let from = graph.node(from);
            let to = graph.node(to);
            graph.add_reference(from, to, any_edge());
        }
        graph
    }

    #[test]
    fn test_graph_creation() {
        let graph = ClosureGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_node_is_reused() {
        let mut graph = ClosureGraph::new();
        let a = graph.node("a");
        let again = graph.add_root("a");
        assert_eq!(a, again);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.roots().count(), 1);

        graph.mark_expanded(a, Version::new(1, 0, 0, 0));
        assert_eq!(graph.get("a").unwrap().version, Some(Version::new(1, 0, 0, 0)));
        assert!(graph.get("b").is_none());
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let graph = graph_of(&["a"], &[("a", "b"), ("a", "b")]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_path_to_prefers_shortest() {
        let graph = graph_of(
            &["a"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")],
        );
        assert_eq!(graph.path_to("d").unwrap(), vec!["a", "d"]);
        assert_eq!(graph.path_to("c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(graph.path_to("a").unwrap(), vec!["a"]);
        assert!(graph.path_to("zzz").is_none());
    }

    #[test]
    fn test_path_from_second_root() {
        let graph = graph_of(&["a", "x"], &[("a", "b"), ("x", "y")]);
        assert_eq!(graph.path_to("y").unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_explain_unsatisfied_edge() {
        let mut graph = graph_of(&["a"], &[("a", "b")]);
        let constraint = Some(VersionConstraint::new(Op::Gte, Version::new(2, 0, 0, 0)));
        let b = graph.node("b");
        let c = graph.node("c");
        graph.add_reference(
            b,
            c,
            ClosureEdge {
                constraint,
                satisfied: false,
            },
        );

        let entry = NameAndVersion {
            name: "c".to_string(),
            constraint,
        };
        assert_eq!(graph.explain(&entry).unwrap(), vec!["a", "b", "c"]);

        // Same name, different constraint: not what failed
        assert!(graph.explain(&NameAndVersion::any("c")).is_none());
    }

    #[test]
    fn test_explain_skips_failed_references() {
        // a -> b (>= 5) fails, but a -> c -> b expands b, whose x is missing
        let mut graph = graph_of(&["a"], &[("a", "c"), ("c", "b")]);
        let a = graph.node("a");
        let b = graph.node("b");
        let x = graph.node("x");
        graph.add_reference(
            a,
            b,
            ClosureEdge {
                constraint: Some(VersionConstraint::new(Op::Gte, Version::new(5, 0, 0, 0))),
                satisfied: false,
            },
        );
        graph.add_reference(
            b,
            x,
            ClosureEdge {
                constraint: None,
                satisfied: false,
            },
        );

        assert_eq!(
            graph.explain(&NameAndVersion::any("x")).unwrap(),
            vec!["a", "c", "b", "x"]
        );
        assert_eq!(graph.path_to("b").unwrap(), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_path_to_ignores_unsatisfied_edges() {
        let mut graph = graph_of(&["a"], &[]);
        let a = graph.node("a");
        let gone = graph.node("gone");
        graph.add_reference(
            a,
            gone,
            ClosureEdge {
                constraint: None,
                satisfied: false,
            },
        );
        assert!(graph.path_to("gone").is_none());
    }

    #[test]
    fn test_explain_missing_root() {
        let graph = graph_of(&["ghost"], &[]);
        assert_eq!(graph.explain(&NameAndVersion::any("ghost")).unwrap(), vec!["ghost"]);
    }

    #[test]
    fn test_cycle_detection() {
        let graph = graph_of(&["a"], &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
        let cycles = graph.cycles();

        assert_eq!(cycles.len(), 1);
        let mut members = cycles[0].clone();
        members.sort_unstable();
        assert_eq!(members, vec!["a", "b", "c"]);

        let formatted = ClosureGraph::format_cycle(&cycles[0]);
        assert!(formatted.contains("->"));
        assert_eq!(formatted.matches("->").count(), 3);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let graph = graph_of(&["a"], &[("a", "a"), ("a", "b")]);
        assert_eq!(graph.cycles(), vec![vec!["a"]]);
        assert_eq!(ClosureGraph::format_cycle(&["a"]), "a -> a");
        assert_eq!(ClosureGraph::format_cycle(&[]), "No cycle");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Every reachable node has a path that starts at a root and ends at it
        #[test]
        fn paths_start_at_root(
            edges in prop::collection::vec((0usize..8, 0usize..8), 0..20)
        ) {
            let mut graph = ClosureGraph::new();
            graph.add_root("pkg0");
            for (from, to) in &edges {
                let from = graph.node(&format!("pkg{}", from));
                let to = graph.node(&format!("pkg{}", to));
                graph.add_reference(from, to, ClosureEdge { constraint: None, satisfied: true });
            }

            let names: Vec<String> = graph.nodes().map(|n| n.name.clone()).collect();
            for name in &names {
                if let Some(path) = graph.path_to(name) {
                    prop_assert_eq!(path.first().copied(), Some("pkg0"));
                    prop_assert_eq!(path.last().copied(), Some(name.as_str()));
                }
            }
        }

        // Acyclic edge sets (from < to) never report a cycle
        #[test]
        fn forward_edges_have_no_cycles(
            edges in prop::collection::vec((0usize..8, 0usize..8), 0..20)
        ) {
            let mut graph = ClosureGraph::new();
            for (from, to) in edges.iter().filter(|(f, t)| f < t) {
                let from = graph.node(&format!("pkg{}", from));
                let to = graph.node(&format!("pkg{}", to));
                graph.add_reference(from, to, ClosureEdge { constraint: None, satisfied: true });
            }
            prop_assert!(graph.cycles().is_empty());
        }
    }
}
