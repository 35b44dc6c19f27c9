//! Read error types

use thiserror::Error;

/// Error raised while reading a syntax tree from text or JSON
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    /// Unexpected token
    #[error("unexpected token '{found}' at line {line}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        line: usize,
    },

    /// Unexpected end of input
    #[error("unexpected end of input at line {line}, expected {expected}")]
    UnexpectedEof { expected: String, line: usize },

    /// Node tag that names no known kind
    #[error("unknown node kind '{kind}' at line {line}")]
    UnknownKind { kind: String, line: usize },

    /// Invalid escape sequence in a string atom
    #[error("invalid escape sequence '{sequence}' at line {line}")]
    InvalidEscape { sequence: String, line: usize },

    /// Integer atom out of range
    #[error("invalid integer '{literal}' at line {line}")]
    InvalidNumber { literal: String, line: usize },

    /// Lexer error
    #[error("unrecognized input '{text}' at line {line}")]
    Unrecognized { text: String, line: usize },

    /// Malformed JSON tree
    #[error("invalid JSON tree at line {line}: {message}")]
    Json { message: String, line: usize },
}

impl ReadError {
    /// Source line of the error (1-indexed)
    pub fn line(&self) -> usize {
        match self {
            ReadError::UnexpectedToken { line, .. }
            | ReadError::UnexpectedEof { line, .. }
            | ReadError::UnknownKind { line, .. }
            | ReadError::InvalidEscape { line, .. }
            | ReadError::InvalidNumber { line, .. }
            | ReadError::Unrecognized { line, .. }
            | ReadError::Json { line, .. } => *line,
        }
    }

    /// Error message without the location prefix
    pub fn message(&self) -> String {
        match self {
            ReadError::UnexpectedToken {
                found, expected, ..
            } => format!("unexpected token '{}', expected {}", found, expected),
            ReadError::UnexpectedEof { expected, .. } => {
                format!("unexpected end of input, expected {}", expected)
            }
            ReadError::UnknownKind { kind, .. } => format!("unknown node kind '{}'", kind),
            ReadError::InvalidEscape { sequence, .. } => {
                format!("invalid escape sequence '{}'", sequence)
            }
            ReadError::InvalidNumber { literal, .. } => format!("invalid integer '{}'", literal),
            ReadError::Unrecognized { text, .. } => format!("unrecognized input '{}'", text),
            ReadError::Json { message, .. } => message.clone(),
        }
    }
}

impl From<serde_json::Error> for ReadError {
    fn from(err: serde_json::Error) -> Self {
        ReadError::Json {
            message: err.to_string(),
            line: err.line(),
        }
    }
}

/// Result type for reading trees
pub type ReadResult<T> = Result<T, ReadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_message() {
        let err = ReadError::UnknownKind {
            kind: "frob".to_string(),
            line: 7,
        };
        assert_eq!(err.line(), 7);
        assert_eq!(err.message(), "unknown node kind 'frob'");
        assert_eq!(err.to_string(), "unknown node kind 'frob' at line 7");
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<Vec<u8>>("[1,\n2,\nx]").unwrap_err();
        let err = ReadError::from(err);
        assert!(matches!(err, ReadError::Json { .. }));
        assert_eq!(err.line(), 3);
    }
}
