//! The template engine.
//!
//! Loading a template runs three passes over every story part:
//!
//! 1. [`scanner`] finds placeholders in the concatenated run text and turns
//!    each into one field or block marker;
//! 2. [`compile`] pairs block markers and wraps the content between them
//!    into repeated regions;
//! 3. format specifiers are parsed, so bad ones fail the load.
//!
//! Rendering walks the compiled parts with a [`resolver::Scope`] chain and
//! builds fresh XML; the compiled template is never modified.
pub mod api;
pub mod compile;
pub mod format;
pub mod options;
pub mod render;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

#[cfg(test)]
mod tests;

pub use api::{RenderOutput, Template};
pub use options::TemplateOptions;
pub use value::{Accessors, FieldSource, Record, Value};
