//! Compile options
//!
//! Options can be built in code or loaded from a TOML file:
//!
//! ```toml
//! file_name = "bench.rb"
//! emit_comments = false
//! max_loop_iterations = 32
//! ```
//!
//! Missing keys keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// Default bound on loop fixed-point iterations before widening.
pub const MAX_LOOP_ITERATIONS: usize = 100;

/// Options for one compilation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Source file name used in diagnostics and the generated banner
    pub file_name: String,
    /// Whether to emit explanatory comments in the generated C
    pub emit_comments: bool,
    /// Indentation string
    pub indent: String,
    /// Fixed-point iterations allowed per loop before changing variables
    /// are widened to dynamic
    pub max_loop_iterations: usize,
    /// Whether to emit and register glue thunks that expose compiled
    /// methods to the runtime method table
    pub emit_method_glue: bool,
    /// Whether to keep a textual dump of the typed HIR in the output
    pub dump_hir: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            file_name: "-".to_string(),
            emit_comments: true,
            indent: "  ".to_string(),
            max_loop_iterations: MAX_LOOP_ITERATIONS,
            emit_method_glue: true,
            dump_hir: false,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options without comments, for compact output
    pub fn release() -> Self {
        Self {
            emit_comments: false,
            ..Self::default()
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn with_comments(mut self, emit: bool) -> Self {
        self.emit_comments = emit;
        self
    }

    pub fn with_hir_dump(mut self, dump: bool) -> Self {
        self.dump_hir = dump;
        self
    }

    /// Parse options from TOML text
    pub fn from_toml_str(text: &str) -> CompileResult<Self> {
        let options: CompileOptions =
            toml::from_str(text).map_err(|e| CompileError::Options(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> CompileResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> CompileResult<()> {
        if self.max_loop_iterations == 0 {
            return Err(CompileError::Options(
                "max_loop_iterations must be at least 1".to_string(),
            ));
        }
        if self.indent.chars().any(|c| c != ' ' && c != '\t') {
            return Err(CompileError::Options(
                "indent may only contain spaces and tabs".to_string(),
            ));
        }
        Ok(())
    }
}
