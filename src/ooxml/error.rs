/// Error types for OOXML operations.
use thiserror::Error;

/// Result type for OOXML operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for OOXML operations.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] crate::ooxml::opc::error::OpcError),

    /// XML in a part is not well-formed
    #[error("XML error in {part}: {message}")]
    Xml { part: String, message: String },

    /// Part not found
    #[error("Part not found: {0}")]
    PartNotFound(String),
}

impl OoxmlError {
    pub(crate) fn xml<P: Into<String>, M: ToString>(part: P, message: M) -> Self {
        OoxmlError::Xml {
            part: part.into(),
            message: message.to_string(),
        }
    }
}
