// Prevent accidental debug output in library code.
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

//! subset_mruby_aot
//!
//! Ahead-of-time compiler from a statically analyzable mruby subset to C.
//!
//! # Pipeline
//!
//! ```text
//! Node (AST) -> typing -> HIR + dispatch registry -> codegen -> C source
//! ```
//!
//! The typing pass abstractly interprets the program over a lattice of
//! possible runtime classes. Calls whose operands are proven builtin numbers,
//! strings or arrays go straight to runtime primitives; `.new` on a known
//! class goes through a per-arity constructor; everything else goes through
//! a multiplexer that checks the receiver's class against every compiled
//! owner and falls back to the runtime's dynamic dispatch.
//!
//! # Example
//!
//! ```
//! use subset_mruby_aot::{compile_source, CompileOptions};
//!
//! let output = compile_source(
//!     "(scope [x] (begin (asgn (lvar x) (int \"1\" 10)) (call (lvar x) + [(int \"2\" 10)])))",
//!     &CompileOptions::new(),
//! )
//! .unwrap();
//! assert!(output.c_code.contains("num_add(mrb, v_x, mrb_fixnum_value(2))"));
//! assert_eq!(output.stats.fast_path_calls, 1);
//! ```

pub mod codegen;
pub mod dispatch;
pub mod error;
pub mod hir;
pub mod lattice;
pub mod options;
pub mod output;
pub mod scope;
pub mod session;
pub mod typing;

pub use codegen::{CGenerator, CodegenConfig};
pub use error::{CompileError, CompileResult};
pub use lattice::Lattice;
pub use options::CompileOptions;
pub use output::{CompileOutput, CompileStats};
pub use session::Session;

use subset_mruby_ast::{read, Node};
use tracing::debug;

use crate::hir::printer::HirPrinter;

/// Compile one program tree to a C translation unit.
///
/// A fresh session is used for every call, so compiling the same tree twice
/// produces identical output.
pub fn compile(root: &Node, options: &CompileOptions) -> CompileResult<CompileOutput> {
    options.validate()?;
    debug!(file = %options.file_name, "compiling");

    let mut session = Session::new();
    let main = typing::type_program(&mut session, options, root)?;

    let hir_dump = options.dump_hir.then(|| {
        let mut trees: Vec<_> = session.methods().iter().map(|m| m.decl).collect();
        trees.extend_from_slice(session.class_inits());
        trees.push(main);
        HirPrinter::new(&session.hir, &session.vars).render_all(&trees)
    });

    let generator = CGenerator::new(CodegenConfig::from_options(options), &session);
    let (c_code, codegen_stats) = generator.generate()?;

    let mut stats = session.stats.clone();
    stats.merge(&codegen_stats);
    debug!(
        functions = stats.functions_compiled,
        multiplexers = stats.multiplexers,
        "compiled"
    );

    let mut output = CompileOutput::new(c_code, stats);
    for warning in session.warnings.drain(..) {
        output.add_warning(warning);
    }
    output.hir_dump = hir_dump;
    Ok(output)
}

/// Read a tree in S-expression form and compile it. Reader errors become
/// [`CompileError::Syntax`] carrying the configured file name.
pub fn compile_source(source: &str, options: &CompileOptions) -> CompileResult<CompileOutput> {
    let root = read(source).map_err(|e| CompileError::from_read(&options.file_name, e))?;
    compile(&root, options)
}

/// Load a tree from JSON and compile it.
pub fn compile_json(json: &str, options: &CompileOptions) -> CompileResult<CompileOutput> {
    let root = Node::from_json(json).map_err(|e| CompileError::from_read(&options.file_name, e))?;
    compile(&root, options)
}
