//! Repository index parsing and package storage for rdep
//!
//! This crate turns the text of a `PACKAGES`-style index file into typed
//! `Package` records and keeps them in an insertion-ordered `Repository`.

pub mod parser;
pub mod repository;

// Re-export main types
pub use parser::{parse, Diagnostic, MissingVersion, ParseOptions, ParseOutput};
pub use repository::{ReadSummary, Repository};
