//! C code generation.
//!
//! Emits one C translation unit against the mruby API for a typed session.
//! Compiled method bodies are plain C functions taking the interpreter state,
//! the receiver and one `mrb_value` per parameter. Calls the typing pass
//! could not resolve go through a multiplexer per `(name, argc)` that tests
//! the receiver's class against every compiled owner and falls back to
//! `mrb_funcall`.
//!
//! # Module structure
//!
//! - `names`: C identifiers and string literals
//! - `program`: sections, multiplexers, constructors and glue
//! - `statements`: statement emission
//! - `expressions`: expression emission

pub mod names;
mod expressions;
mod program;
mod statements;

#[cfg(test)]
mod tests;

use crate::error::CompileResult;
use crate::options::CompileOptions;
use crate::output::CompileStats;
use crate::session::Session;

/// Configuration for code generation
#[derive(Debug, Clone)]
pub struct CodegenConfig {
    /// Source file name for the banner
    pub file_name: String,
    /// Whether to generate comments
    pub emit_comments: bool,
    /// Indentation string
    pub indent: String,
    /// Whether to emit glue thunks and register compiled methods with the
    /// runtime
    pub emit_method_glue: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self::from_options(&CompileOptions::default())
    }
}

impl CodegenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &CompileOptions) -> Self {
        Self {
            file_name: options.file_name.clone(),
            emit_comments: options.emit_comments,
            indent: options.indent.clone(),
            emit_method_glue: options.emit_method_glue,
        }
    }
}

/// C code generator over one typed session.
#[derive(Debug)]
pub struct CGenerator<'s> {
    config: CodegenConfig,
    session: &'s Session,
    /// Output buffer
    output: String,
    /// Current indentation level
    indent_level: usize,
    /// Counter for loop induction temporaries
    loop_counter: usize,
    /// Counter for values computed by statements
    value_counter: usize,
    stats: CompileStats,
}

impl<'s> CGenerator<'s> {
    pub fn new(config: CodegenConfig, session: &'s Session) -> Self {
        Self {
            config,
            session,
            output: String::new(),
            indent_level: 0,
            loop_counter: 0,
            value_counter: 0,
            stats: CompileStats::new(),
        }
    }

    /// Write a line with current indentation
    fn write_line(&mut self, line: &str) {
        for _ in 0..self.indent_level {
            self.output.push_str(&self.config.indent);
        }
        self.output.push_str(line);
        self.output.push('\n');
    }

    /// Write a comment line when comments are enabled
    fn comment(&mut self, text: &str) {
        if self.config.emit_comments {
            self.write_line(&format!("/* {} */", text.replace("*/", "* /")));
        }
    }

    fn blank_line(&mut self) {
        self.output.push('\n');
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Generate the translation unit. Returns the C text and the code
    /// generation statistics.
    pub fn generate(mut self) -> CompileResult<(String, CompileStats)> {
        self.output.clear();
        self.indent_level = 0;
        self.emit_program()?;
        Ok((self.output, self.stats))
    }
}
