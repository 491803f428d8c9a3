//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::{Error, Location};
use crate::ooxml::error::OoxmlError;
use crate::ooxml::opc::error::OpcError;

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        match err {
            OpcError::Io(e) => Error::Io(e),
            other => Error::Package(other.to_string()),
        }
    }
}

impl From<OoxmlError> for Error {
    fn from(err: OoxmlError) -> Self {
        match err {
            OoxmlError::Opc(e) => Error::from(e),
            OoxmlError::Xml { part, message } => Error::malformed(message, Location::part(part)),
            OoxmlError::PartNotFound(s) => Error::Package(format!("Part not found: {}", s)),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Package(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Data(err.to_string())
    }
}
