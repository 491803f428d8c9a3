//! Common types and utilities shared by the package layer and the template engine.

// Submodule declarations
pub mod error;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Location, Result};
