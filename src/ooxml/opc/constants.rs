//! Namespace, content type and relationship type URIs.
//!
//! Only the values needed to locate story parts and to write minimal
//! packages are listed.

/// Content types written to `[Content_Types].xml`
pub mod content_type {
    pub const OPC_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";

    pub const WML_DOCUMENT_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const WML_HEADER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
    pub const WML_FOOTER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
    pub const WML_FOOTNOTES: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml";
}

pub mod namespace {
    /// Relationship ids (`r:id`) and relationship type prefix
    pub const OFC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    /// Root element of `.rels` parts
    pub const OPC_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";
    /// Root element of `[Content_Types].xml`
    pub const OPC_CONTENT_TYPES: &str =
        "http://schemas.openxmlformats.org/package/2006/content-types";
    pub const WML_MAIN: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
}

/// Values of the `TargetMode` attribute
pub mod target_mode {
    pub const INTERNAL: &str = "Internal";
    pub const EXTERNAL: &str = "External";
}

/// Relationship type URIs.
///
/// Strict OOXML names the same relationships under
/// `http://purl.oclc.org/ooxml/officeDocument/relationships/`, so lookups
/// compare only the final path segment (see [`reltype_suffix`]).
pub mod relationship_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
}

/// The last path segment of a relationship type URI (`officeDocument`, `header`, ...).
#[inline]
pub fn reltype_suffix(reltype: &str) -> &str {
    reltype.rsplit('/').next().unwrap_or(reltype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reltype_suffix_matches_strict_namespace() {
        assert_eq!(
            reltype_suffix("http://schemas.openxmlformats.org/officeDocument/2006/relationships/header"),
            "header"
        );
        assert_eq!(
            reltype_suffix("http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument"),
            reltype_suffix(relationship_type::OFFICE_DOCUMENT)
        );
    }
}
