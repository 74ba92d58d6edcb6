//! Core data types for rdep.
//!
//! This module provides the fundamental types used throughout the workspace:
//! - Version types and relational constraints
//! - Package records
//! - Dependency references and the buffers that carry them

pub mod buffer;
pub mod dependency;
pub mod package;
pub mod version;

// Re-export all public types
pub use buffer::NameVersionBuffer;
pub use dependency::NameAndVersion;
pub use package::Package;
pub use version::{Op, Version, VersionConstraint, VersionError};
