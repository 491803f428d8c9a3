//! Quince - Word (.docx) template merging
//!
//! Quince loads a `.docx` template containing `{{placeholders}}`, merges it
//! with data and produces the bytes of a new `.docx` package.
//!
//! # Features
//!
//! - **Split-run placeholders**: a placeholder Word split across differently
//!   formatted runs is still found, and takes the formatting of its first run
//! - **Repeated regions**: `{{#items}}...{{/items}}` repeats inline text,
//!   paragraphs or table rows, depending on where the markers sit
//! - **Typed formatting**: `{{total | #,##0.00}}`, `{{due | dd MMMM yyyy}}`,
//!   `{{amount | %.2f}}`, `{{paid | Yes/No}}`
//! - **Flexible data**: maps, lists, anything `serde::Serialize`, or structs
//!   exposed through registered accessors
//! - **Faithful output**: untouched package members are copied byte-for-byte
//!
//! # Example
//!
//! ```no_run
//! use quince::{Template, TemplateOptions, Value};
//!
//! # fn main() -> Result<(), quince::Error> {
//! let template = Template::from_file_with_options(
//!     "invoice.docx",
//!     TemplateOptions::new().with_strict(true),
//! )?;
//!
//! let data = Value::map([
//!     ("customer", Value::map([("name", Value::from("Ada Lovelace"))])),
//!     (
//!         "items",
//!         Value::List(vec![
//!             Value::map([("sku", Value::from("A-1")), ("qty", Value::from(2))]),
//!             Value::map([("sku", Value::from("B-7")), ("qty", Value::from(1))]),
//!         ]),
//!     ),
//! ]);
//!
//! template.render(&data)?.write_to_file("invoice-ada.docx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Structs without serde
//!
//! ```
//! use quince::{Accessors, Record, Value};
//! use std::sync::Arc;
//!
//! struct Customer {
//!     name: String,
//!     vip: bool,
//! }
//!
//! let accessors = Arc::new(
//!     Accessors::new()
//!         .field("name", |c: &Customer| c.name.as_str().into())
//!         .field("vip", |c: &Customer| c.vip.into()),
//! );
//! let customer = Value::from(Record::new(Customer { name: "Ada".into(), vip: true }, accessors));
//! assert_eq!(customer.get("name"), Some(Value::from("Ada")));
//! ```

/// Errors and XML text helpers shared by every layer
pub mod common;

/// Office Open XML packages and the WordprocessingML body model
pub mod ooxml;

/// Placeholder recognition, data binding and rendering
pub mod template;

// Re-export commonly used types for convenience
pub use common::{Error, Location, Result};
pub use template::{
    Accessors, FieldSource, RenderOutput, Record, Template, TemplateOptions, Value,
};
