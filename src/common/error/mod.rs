//! Unified error types for Quince.
//!
//! Every failure surfaced by loading or rendering a template is reported as
//! one [`Error`], carrying enough context (token text, path, part and
//! paragraph) to fix either the template or the data.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Location, Result};
