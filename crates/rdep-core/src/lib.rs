//! # rdep-core
//!
//! Core types shared across all rdep crates.
//!
//! This crate provides:
//! - Version, Op and VersionConstraint for four-component package versions
//! - NameAndVersion and Package records as found in a repository index file
//! - NameVersionBuffer, the owned sequence used to pass references around
//! - RdepError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, Package, etc.)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{RdepError, RdepResult};
pub use types::{NameAndVersion, NameVersionBuffer, Op, Package, Version, VersionConstraint};
