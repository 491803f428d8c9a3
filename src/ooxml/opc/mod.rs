//! Open Packaging Conventions (OPC) implementation.
//!
//! This module provides the subset of Open Packaging Conventions a template engine
//! needs: reading parts and relationships out of a ZIP container, and
//! rewriting the container with selected parts replaced.
//!
//! - Package structure (parts, relationships)
//! - ZIP-based physical packaging with raw copies of untouched members
//! - Uses `quick-xml` for relationship parsing

pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod phys_pkg;
pub mod rel;

// Re-export commonly used types
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use rel::{Relationship, Relationships};
