//! Package index and unsatisfied-dependency resolver for rdep
//!
//! This crate builds a name-keyed index over a parsed repository and walks
//! the dependency closure of one or more root packages, reporting every
//! dependency constraint that no package in the repository can satisfy.

pub mod graph;
pub mod index;
pub mod resolver;

// Re-export main types
pub use graph::{ClosureEdge, ClosureGraph, ClosureNode};
pub use index::{HighestMatching, Index, LowestMatching, Selection, SelectionPolicy};
pub use resolver::{CheckReport, Resolution, Resolver, RevisitPolicy};
