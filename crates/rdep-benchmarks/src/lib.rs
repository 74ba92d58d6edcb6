//! rdep benchmarking suite
//!
//! Benchmarks for parsing repository index files and for resolving
//! dependency closures over them.

pub mod common;

pub use common::*;
