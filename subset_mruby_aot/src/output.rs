//! Compilation output and statistics.

use serde::Serialize;

use crate::error::CompileResult;

/// Statistics collected during compilation
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    /// Method bodies emitted
    pub functions_compiled: usize,
    /// Class initializer bodies emitted
    pub class_initializers: usize,
    /// Multiplexers emitted
    pub multiplexers: usize,
    /// Constructor dispatchers emitted
    pub constructors: usize,
    /// Calls specialized to a runtime primitive
    pub fast_path_calls: usize,
    /// Calls routed through a multiplexer
    pub dispatched_calls: usize,
    /// Calls routed through a constructor dispatcher
    pub constructor_calls: usize,
    /// Counted loops lowered from `times`
    pub counted_loops: usize,
    /// Loop fixed-point iterations performed while typing
    pub loop_iterations: usize,
    /// Variables widened to dynamic because a loop did not converge
    pub widened_variables: usize,
}

impl CompileStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge statistics from another compilation
    pub fn merge(&mut self, other: &CompileStats) {
        self.functions_compiled += other.functions_compiled;
        self.class_initializers += other.class_initializers;
        self.multiplexers += other.multiplexers;
        self.constructors += other.constructors;
        self.fast_path_calls += other.fast_path_calls;
        self.dispatched_calls += other.dispatched_calls;
        self.constructor_calls += other.constructor_calls;
        self.counted_loops += other.counted_loops;
        self.loop_iterations += other.loop_iterations;
        self.widened_variables += other.widened_variables;
    }
}

/// Output from one compilation
#[derive(Debug)]
pub struct CompileOutput {
    /// Generated C translation unit
    pub c_code: String,
    /// Compilation statistics
    pub stats: CompileStats,
    /// Analysis warnings
    pub warnings: Vec<String>,
    /// Typed HIR dump, when requested
    pub hir_dump: Option<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    stats: &'a CompileStats,
    warnings: &'a [String],
}

impl CompileOutput {
    pub fn new(c_code: String, stats: CompileStats) -> Self {
        Self {
            c_code,
            stats,
            warnings: Vec::new(),
            hir_dump: None,
        }
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Statistics and warnings as a JSON document
    pub fn report_json(&self) -> CompileResult<String> {
        Ok(serde_json::to_string_pretty(&Report {
            stats: &self.stats,
            warnings: &self.warnings,
        })?)
    }
}
