//! Office Open XML (OOXML) support.
//!
//! Two layers are provided:
//!
//! 1. **OPC Layer** (`opc`): the ZIP container, part names and relationships
//! 2. **WordprocessingML** (`docx`): locating story parts, a lossless XML tree
//!    and the paragraph/run/table model the template engine works on
pub mod docx;
pub mod error;
pub mod opc;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{OoxmlError, Result};
