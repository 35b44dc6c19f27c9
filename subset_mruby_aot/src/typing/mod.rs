//! Typing pass: tagged AST to typed HIR.
//!
//! The [`Typer`] walks the tree once per program, threading a scope
//! [`Frame`] through every node. Each node is lowered to a [`HirNode`]
//! annotated with the lattice value it may produce; bindings widen as
//! assignments are typed, and the [`DispatchRegistry`] fills up with every
//! compiled declaration and dispatched call site.
//!
//! # Module structure
//!
//! - `literals`: numbers, strings and array literals
//! - `calls`: method calls, fast paths, constructors and `times`
//! - `control`: conditionals, loops and short-circuit operators
//! - `defs`: method and class definitions, return insertion
//!
//! [`HirNode`]: crate::hir::HirNode
//! [`DispatchRegistry`]: crate::dispatch::DispatchRegistry

mod calls;
mod control;
mod defs;
mod literals;

#[cfg(test)]
mod tests;

use subset_mruby_ast::{Child, Node, NodeKind};
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::hir::{FunctionRole, HirId, HirKind, VarId, VarKind};
use crate::lattice::{ConstValue, Lattice};
use crate::options::CompileOptions;
use crate::scope::Frame;
use crate::session::Session;

/// What kind of body is being typed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ContextKind {
    TopLevel,
    ClassBody { class: String, serial: usize },
    Method,
}

/// Per-function typing state.
#[derive(Debug)]
struct FnContext {
    kind: ContextKind,
    loop_depth: usize,
    /// Compiler temporaries, declared at function scope
    temps: Vec<VarId>,
    /// Methods defined directly in a class body
    defined: Vec<(String, usize)>,
}

impl FnContext {
    fn new(kind: ContextKind) -> Self {
        Self {
            kind,
            loop_depth: 0,
            temps: Vec::new(),
            defined: Vec::new(),
        }
    }
}

/// Type a whole program, filling `session` with its functions.
///
/// Returns the `FunctionDecl` of the top-level program.
pub fn type_program(
    session: &mut Session,
    options: &CompileOptions,
    root: &Node,
) -> CompileResult<HirId> {
    let mut typer = Typer::new(session, options.max_loop_iterations);
    let frame = Frame::root(Vec::new(), None, Lattice::Constant(ConstValue::Main));
    let body = typer.type_node(&frame, root)?;
    let (body, return_type) = typer.finish_function(body, root.line)?;
    let main = typer.alloc(
        HirKind::FunctionDecl {
            role: FunctionRole::Main,
            name: "main".to_string(),
            params: Vec::new(),
            body,
            return_type: return_type.clone(),
        },
        return_type,
        root.line,
    );
    typer.session.set_main(main);
    debug!(
        nodes = typer.session.hir.len(),
        methods = typer.session.methods().len(),
        "typed program"
    );
    Ok(main)
}

/// Lowers AST nodes to typed HIR.
#[derive(Debug)]
pub struct Typer<'s> {
    session: &'s mut Session,
    max_loop_iterations: usize,
    current: FnContext,
}

impl<'s> Typer<'s> {
    pub fn new(session: &'s mut Session, max_loop_iterations: usize) -> Self {
        Self {
            session,
            max_loop_iterations,
            current: FnContext::new(ContextKind::TopLevel),
        }
    }

    fn alloc(&mut self, kind: HirKind, lattice: Lattice, line: u32) -> HirId {
        self.session.hir.alloc(kind, lattice, line)
    }

    fn lattice_of(&self, id: HirId) -> Lattice {
        self.session.hir.lattice(id).clone()
    }

    fn empty(&mut self, line: u32) -> HirId {
        self.alloc(HirKind::Empty, Lattice::nil(), line)
    }

    /// A compiler temporary declared at the scope of the current function.
    fn new_temp(&mut self, prefix: &str) -> VarId {
        let name = self.session.fresh_temp(prefix);
        let var = self.session.vars.alloc(name, VarKind::Local, Lattice::Unknown);
        self.current.temps.push(var);
        var
    }

    /// Type one node in `frame`.
    pub fn type_node(&mut self, frame: &Frame<'_>, node: &Node) -> CompileResult<HirId> {
        let line = node.line;
        match node.kind {
            NodeKind::Scope => self.type_scope(frame, node),
            NodeKind::Begin => self.type_begin(frame, node),

            NodeKind::Int => self.type_int(node, false),
            NodeKind::Float => self.type_float(node, false),
            NodeKind::Str => self.type_str(node),
            NodeKind::Nil => Ok(self.literal_nil(line)),
            NodeKind::True => Ok(self.literal_bool(true, line)),
            NodeKind::False => Ok(self.literal_bool(false, line)),
            NodeKind::Array => self.type_array(frame, node),
            NodeKind::SelfRef => Ok(self.self_ref(frame, line)),

            NodeKind::Lvar => {
                let var = self.resolve_local(frame, node)?;
                Ok(self.read_var(var, line))
            }
            NodeKind::Ivar => {
                let name = expect_sym(node, 0)?;
                let var = frame.lookup_ivar(name, &mut self.session.vars);
                Ok(self.read_var(var, line))
            }
            NodeKind::Gvar => {
                let name = expect_sym(node, 0)?;
                let var = self.session.lookup_global(name, line);
                Ok(self.alloc(HirKind::Var(var), Lattice::Dynamic, line))
            }
            NodeKind::Cvar => {
                let var = self.resolve_class_var(frame, node)?;
                Ok(self.alloc(HirKind::Var(var), Lattice::Dynamic, line))
            }
            NodeKind::Const => {
                let name = expect_sym(node, 0)?;
                let var = self.session.lookup_constant(name, line);
                Ok(self.read_var(var, line))
            }

            NodeKind::Asgn => {
                let target = expect_node(node, 0)?;
                let value = expect_node(node, 1)?;
                self.type_assign(frame, target, value, line)
            }
            NodeKind::OpAsgn => self.type_op_assign(frame, node),

            NodeKind::If => self.type_if(frame, node, false),
            NodeKind::Unless => self.type_if(frame, node, true),
            NodeKind::While => self.type_while(frame, node, false),
            NodeKind::Until => self.type_while(frame, node, true),
            NodeKind::Break => self.type_jump(node, HirKind::Break),
            NodeKind::Next => self.type_jump(node, HirKind::Continue),
            NodeKind::Return => self.type_return(frame, node),
            NodeKind::And => self.type_logical(frame, node, true),
            NodeKind::Or => self.type_logical(frame, node, false),
            NodeKind::Not => {
                let operand = expect_node(node, 0)?;
                self.type_send(frame, Some(operand), "!", &[], line)
            }
            NodeKind::Negate => self.type_negate(frame, node),

            NodeKind::Call | NodeKind::Fcall => self.type_call(frame, node),
            NodeKind::Def => self.type_def(node),
            NodeKind::Class => self.type_class(node),
            NodeKind::Module => Err(CompileError::unsupported("module", line)),
            NodeKind::Block => Err(CompileError::malformed(
                node.kind,
                line,
                "block outside of a method call",
            )),

            other => Err(CompileError::unsupported(other.as_str(), line)),
        }
    }

    /// `(scope [locals] body?)`: declares the locals not already visible.
    fn type_scope(&mut self, frame: &Frame<'_>, node: &Node) -> CompileResult<HirId> {
        let line = node.line;
        let names = node
            .sym_list(0)
            .ok_or_else(|| CompileError::malformed(node.kind, line, "expected a locals list"))?;

        let mut bindings: Vec<(String, VarId)> = Vec::new();
        for name in names {
            if frame.lookup_local(name).is_some() || bindings.iter().any(|(n, _)| n == name) {
                continue;
            }
            let var = self.session.vars.alloc(name, VarKind::Local, Lattice::Unknown);
            bindings.push((name.to_string(), var));
        }

        let inner = Frame::new(frame, bindings);
        let body = match node.node(1) {
            Some(body) => self.type_node(&inner, body)?,
            None => self.empty(line),
        };

        let decls = inner
            .locals()
            .iter()
            .map(|(_, var)| {
                let lattice = self.session.vars.lattice(*var).clone();
                self.alloc(HirKind::LocalDecl { var: *var, init: None }, lattice, line)
            })
            .collect();
        let lattice = self.lattice_of(body);
        Ok(self.alloc(HirKind::Scope { decls, body }, lattice, line))
    }

    /// `(begin stmt*)`: value of the last statement, or nil.
    fn type_begin(&mut self, frame: &Frame<'_>, node: &Node) -> CompileResult<HirId> {
        let mut stmts = Vec::new();
        for stmt in node.nodes_from(0) {
            stmts.push(self.type_node(frame, stmt)?);
        }
        let lattice = match stmts.last() {
            Some(last) => self.lattice_of(*last),
            None => Lattice::nil(),
        };
        Ok(self.alloc(HirKind::Block(stmts), lattice, node.line))
    }

    fn self_ref(&mut self, frame: &Frame<'_>, line: u32) -> HirId {
        self.alloc(HirKind::SelfRef, frame.self_lattice().clone(), line)
    }

    fn read_var(&mut self, var: VarId, line: u32) -> HirId {
        let lattice = self.session.vars.lattice(var).clone();
        self.alloc(HirKind::Var(var), lattice, line)
    }

    fn resolve_local(&self, frame: &Frame<'_>, node: &Node) -> CompileResult<VarId> {
        let name = expect_sym(node, 0)?;
        frame
            .lookup_local(name)
            .ok_or_else(|| CompileError::UndefinedLocal {
                name: name.to_string(),
                line: node.line,
            })
    }

    fn resolve_class_var(&mut self, frame: &Frame<'_>, node: &Node) -> CompileResult<VarId> {
        let name = expect_sym(node, 0)?;
        match frame.class_name() {
            Some(class) => Ok(self.session.lookup_class_var(class, name)),
            None => Err(CompileError::unsupported(
                format!("class variable {} outside of a class", name),
                node.line,
            )),
        }
    }

    /// Assignment to a variable, attribute or index target.
    fn type_assign(
        &mut self,
        frame: &Frame<'_>,
        target: &Node,
        value: &Node,
        line: u32,
    ) -> CompileResult<HirId> {
        let var = match target.kind {
            NodeKind::Lvar => self.resolve_local(frame, target)?,
            NodeKind::Ivar => frame.lookup_ivar(expect_sym(target, 0)?, &mut self.session.vars),
            NodeKind::Gvar => self.session.lookup_global(expect_sym(target, 0)?, line),
            NodeKind::Cvar => self.resolve_class_var(frame, target)?,
            NodeKind::Const => return self.type_const_assign(frame, target, value, line),
            NodeKind::Call => return self.type_setter(frame, target, value, line),
            other => {
                return Err(CompileError::unsupported(
                    format!("assignment to {}", other),
                    line,
                ))
            }
        };

        let value = self.type_node(frame, value)?;
        let lattice = self.lattice_of(value);
        self.session.vars.widen(var, &lattice);
        Ok(self.alloc(HirKind::Assign { target: var, value }, lattice, line))
    }

    /// `recv.name = value` / `recv[i] = value`. The value goes through a
    /// temporary so the expression yields it whatever the setter returns.
    fn type_setter(
        &mut self,
        frame: &Frame<'_>,
        target: &Node,
        value: &Node,
        line: u32,
    ) -> CompileResult<HirId> {
        let name = expect_sym(target, 1)?;
        let setter = if name == "[]" {
            "[]=".to_string()
        } else {
            format!("{}=", name)
        };
        let recv = match target.node(0) {
            Some(recv) => self.type_node(frame, recv)?,
            None => self.self_ref(frame, line),
        };
        let mut operands = vec![recv];
        for arg in call_args(target)? {
            operands.push(self.type_node(frame, arg)?);
        }
        let value = self.type_node(frame, value)?;
        let lattice = self.lattice_of(value);

        let temp = self.new_temp("asgn");
        self.session.vars.widen(temp, &lattice);
        let assign = self.alloc(
            HirKind::Assign {
                target: temp,
                value,
            },
            lattice.clone(),
            line,
        );
        operands.push(self.alloc(HirKind::Var(temp), lattice.clone(), line));
        let call = self.send_typed(frame, &setter, operands, line)?;
        let result = self.alloc(HirKind::Var(temp), lattice.clone(), line);
        Ok(self.alloc(HirKind::Block(vec![assign, call, result]), lattice, line))
    }

    /// Constants are assigned once at top level; rebinding to the same value
    /// (a reopened class) is allowed.
    fn type_const_assign(
        &mut self,
        frame: &Frame<'_>,
        target: &Node,
        value: &Node,
        line: u32,
    ) -> CompileResult<HirId> {
        let name = expect_sym(target, 0)?;
        if self.current.kind != ContextKind::TopLevel {
            return Err(CompileError::unsupported(
                format!("assignment to constant {} inside a class or method", name),
                line,
            ));
        }
        let var = self.session.lookup_constant(name, line);
        let value = self.type_node(frame, value)?;
        let lattice = self.lattice_of(value);
        let current = self.session.vars.lattice(var);
        if !current.is_unknown() && !lattice.is_subsumed_by(current) {
            return Err(CompileError::unsupported(
                format!("reassignment of constant {}", name),
                line,
            ));
        }
        self.session.vars.widen(var, &lattice);
        Ok(self.alloc(HirKind::Assign { target: var, value }, lattice, line))
    }

    /// `(op_asgn target op value)`, rewritten to a plain assignment.
    fn type_op_assign(&mut self, frame: &Frame<'_>, node: &Node) -> CompileResult<HirId> {
        let line = node.line;
        let target = expect_node(node, 0)?;
        let op = expect_sym(node, 1)?;
        let value = expect_node(node, 2)?;

        if target.kind == NodeKind::Call {
            let simple_recv = target.node(0).map_or(true, is_simple_node);
            let simple_args = call_args(target)?.into_iter().all(is_simple_node);
            if !(simple_recv && simple_args) {
                return Err(CompileError::unsupported(
                    "compound assignment to a computed target",
                    line,
                ));
            }
        }

        let combined = match op {
            "||" => Node::with_children(
                NodeKind::Or,
                line,
                vec![Child::Node(target.clone()), Child::Node(value.clone())],
            ),
            "&&" => Node::with_children(
                NodeKind::And,
                line,
                vec![Child::Node(target.clone()), Child::Node(value.clone())],
            ),
            op => Node::with_children(
                NodeKind::Call,
                line,
                vec![
                    Child::Node(target.clone()),
                    Child::Sym(op.to_string()),
                    Child::List(vec![Child::Node(value.clone())]),
                ],
            ),
        };
        self.type_assign(frame, target, &combined, line)
    }
}

/// Node child at `index`, or a malformed-tree error.
fn expect_node(node: &Node, index: usize) -> CompileResult<&Node> {
    node.node(index).ok_or_else(|| {
        CompileError::malformed(node.kind, node.line, format!("expected a node at {}", index))
    })
}

/// Symbol child at `index`, or a malformed-tree error.
fn expect_sym(node: &Node, index: usize) -> CompileResult<&str> {
    node.sym(index).ok_or_else(|| {
        CompileError::malformed(node.kind, node.line, format!("expected a name at {}", index))
    })
}

/// Argument nodes of a `call`/`fcall`; a missing or nil list is empty.
fn call_args(node: &Node) -> CompileResult<Vec<&Node>> {
    let index = if node.kind == NodeKind::Fcall { 1 } else { 2 };
    match node.child(index) {
        None | Some(Child::Nil) => Ok(Vec::new()),
        Some(Child::List(items)) => items
            .iter()
            .map(|item| {
                item.as_node().ok_or_else(|| {
                    CompileError::malformed(node.kind, node.line, "argument is not a node")
                })
            })
            .collect(),
        Some(_) => Err(CompileError::malformed(
            node.kind,
            node.line,
            "expected an argument list",
        )),
    }
}

/// Nodes that can be evaluated twice without observable difference.
fn is_simple_node(node: &Node) -> bool {
    node.kind.is_literal() || node.kind.is_variable() || node.kind == NodeKind::SelfRef
}
