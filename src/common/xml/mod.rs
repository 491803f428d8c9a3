//! XML text helpers.

pub mod escape;

pub use escape::{escape_xml, strip_invalid_xml_chars, unescape_xml};
