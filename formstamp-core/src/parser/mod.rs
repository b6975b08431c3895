//! PDF Parser Module
//!
//! Reads the subset of ISO 32000-1 needed to load form templates: the
//! object syntax, classic and stream cross-reference sections, compressed
//! object streams, and the common stream filters.

pub mod filters;
pub mod lexer;
pub mod object_stream;
pub mod objects;
pub mod reader;
pub mod xref;

pub use self::lexer::{Lexer, Token};
pub use self::objects::{LengthResolver, ObjectParser};
pub use self::reader::load_document;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Empty file")]
    EmptyFile,

    #[error("Invalid PDF header")]
    InvalidHeader,

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Invalid xref table: {0}")]
    InvalidXRef(String),

    #[error("Invalid trailer")]
    InvalidTrailer,

    #[error("Stream decode error: {0}")]
    StreamDecodeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::SyntaxError {
            position: 17,
            message: "Unterminated string".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Syntax error at position 17: Unterminated string"
        );
        assert_eq!(
            ParseError::MissingKey("Root".to_string()).to_string(),
            "Missing required key: Root"
        );
    }
}
