//! Compilation errors
//!
//! Two classes exist. A syntax error forwarded from the tree reader is
//! recoverable: the driver reports it and exits cleanly. Every other variant
//! is fatal: it names a construct the compiler does not model, and nothing
//! generated after it could be trusted.

use std::path::PathBuf;

use subset_mruby_ast::ReadError;
use thiserror::Error;

/// Compilation error
#[derive(Debug, Error)]
pub enum CompileError {
    /// Front-end error from the tree reader
    #[error("{file}:{line}: syntax error: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },

    /// Language feature outside the compiled subset
    #[error("line {line}: unsupported construct: {construct}")]
    Unsupported { construct: String, line: u32 },

    /// Node whose children do not have the expected shape
    #[error("line {line}: malformed {kind} node: {detail}")]
    MalformedAst {
        kind: String,
        line: u32,
        detail: String,
    },

    /// Local variable that no enclosing scope declares
    #[error("line {line}: undefined local variable '{name}'")]
    UndefinedLocal { name: String, line: u32 },

    /// Code generation error
    #[error("code generation error: {0}")]
    Codegen(String),

    /// Invalid compile options
    #[error("invalid options: {0}")]
    Options(String),

    /// I/O failure while loading an options file
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Statistics report serialization failure
    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

impl CompileError {
    /// Wrap a reader error with the name of the file being compiled
    pub fn from_read(file: &str, err: ReadError) -> Self {
        CompileError::Syntax {
            file: file.to_string(),
            line: err.line(),
            message: err.message(),
        }
    }

    pub fn unsupported(construct: impl Into<String>, line: u32) -> Self {
        CompileError::Unsupported {
            construct: construct.into(),
            line,
        }
    }

    pub fn malformed(kind: impl ToString, line: u32, detail: impl Into<String>) -> Self {
        CompileError::MalformedAst {
            kind: kind.to_string(),
            line,
            detail: detail.into(),
        }
    }

    /// Whether the driver must abort instead of reporting and exiting cleanly
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CompileError::Unsupported { .. }
                | CompileError::MalformedAst { .. }
                | CompileError::UndefinedLocal { .. }
                | CompileError::Codegen(_)
        )
    }
}

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;
