//! Error types for shaledb
//!
//! One error enum serves the whole workspace. We use `thiserror` for
//! automatic `Display` and `Error` trait implementations.
//!
//! Parse errors carry the character position that made the lexer or
//! parser give up, so the shell can point at the offending spot.

use std::io;
use thiserror::Error;

/// Result type alias for shaledb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the document store
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (WAL append, snapshot read/write)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Malformed filter or value expression
    #[error("parse error at position {position}: {message}")]
    Parse {
        /// Character offset of the offending token
        position: usize,
        /// What the parser expected or found
        message: String,
    },

    /// Invalid caller input (empty id, unknown entity, empty path)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Construct a parse error at the given character position
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            position,
            message: message.into(),
        }
    }

    /// Check if this error came from the filter parser
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
    }

    #[test]
    fn test_error_display_parse() {
        let err = Error::parse(7, "expected ')'");
        let msg = err.to_string();
        assert!(msg.contains("position 7"));
        assert!(msg.contains("expected ')'"));
        assert!(err.is_parse());
    }

    #[test]
    fn test_error_display_invalid_argument() {
        let err = Error::InvalidArgument("entity id must be non-empty".to_string());
        assert!(err.to_string().contains("invalid argument"));
        assert!(!err.is_parse());
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json");
        let err: Error = bad.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
