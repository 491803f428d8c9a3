//! Errors raised while reading or writing the package container.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    /// A part name or relationship target that is not a valid pack URI
    #[error("Invalid pack URI: {0}")]
    InvalidPackUri(String),

    /// No archive member for the requested part
    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    /// A `.rels` part that is not well-formed
    #[error("Malformed relationships: {0}")]
    Rels(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl From<quick_xml::events::attributes::AttrError> for OpcError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OpcError::Rels(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;
