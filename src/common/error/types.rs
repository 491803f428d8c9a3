//! Unified error types for Quince.
use std::fmt;
use thiserror::Error;

/// Where in a template an error was detected.
///
/// `part` is the package member name (e.g. `word/document.xml`); `paragraph`
/// is the 1-based ordinal of the paragraph inside that part, counted in
/// document order including paragraphs nested in tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub part: String,
    pub paragraph: Option<usize>,
}

impl Location {
    /// Location covering a whole part.
    pub fn part<S: Into<String>>(part: S) -> Self {
        Self {
            part: part.into(),
            paragraph: None,
        }
    }

    /// Location of one paragraph inside a part.
    pub fn paragraph<S: Into<String>>(part: S, paragraph: usize) -> Self {
        Self {
            part: part.into(),
            paragraph: Some(paragraph),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.paragraph {
            Some(n) => write!(f, "{}, paragraph {}", self.part, n),
            None if self.part.is_empty() => f.write_str("<unknown>"),
            None => f.write_str(&self.part),
        }
    }
}

/// Main error type for Quince operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not a zip container or lacks the main document part
    #[error("Package error: {0}")]
    Package(String),

    /// XML the run model cannot parse, or placeholders that cannot be compiled
    #[error("Malformed template at {location}: {message}")]
    MalformedTemplate { message: String, location: Location },

    /// A block marker with no matching close (or open)
    #[error("Unmatched block marker '{token}' at {location}")]
    UnmatchedBlock { token: String, location: Location },

    /// Strict mode: a path resolved to nothing
    #[error("Unresolved path '{path}' in '{token}' at {location}")]
    UnresolvedPath {
        path: String,
        token: String,
        location: Location,
    },

    /// Invalid format specifier, or a specifier that does not fit the value
    #[error("Invalid format '{spec}' in '{token}' at {location}: {reason}")]
    Format {
        token: String,
        spec: String,
        reason: String,
        location: Location,
    },

    /// A value whose shape does not fit the token it is bound to
    #[error("Type mismatch in '{token}' at {location}: {reason}")]
    TypeMismatch {
        token: String,
        reason: String,
        location: Location,
    },

    /// Rejected [`TemplateOptions`](crate::TemplateOptions)
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Render data that cannot be converted into a [`Value`](crate::Value)
    #[error("Data error: {0}")]
    Data(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::MalformedTemplate`].
    pub fn malformed<S: Into<String>>(message: S, location: Location) -> Self {
        Error::MalformedTemplate {
            message: message.into(),
            location,
        }
    }

    /// The template location attached to this error, if any.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Error::MalformedTemplate { location, .. }
            | Error::UnmatchedBlock { location, .. }
            | Error::UnresolvedPath { location, .. }
            | Error::Format { location, .. }
            | Error::TypeMismatch { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// Result type for Quince operations.
pub type Result<T> = std::result::Result<T, Error>;
