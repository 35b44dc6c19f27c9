//! Method and class definitions.
//!
//! Each `def` body is typed once, in a fresh frame whose parameters start
//! `Unknown`, and registered in the dispatch registry under its owner. Each
//! `class` body becomes an initializer function run when the class object is
//! created at run time.

use std::mem;

use subset_mruby_ast::{Child, Node, NodeKind};
use tracing::debug;

use super::{expect_sym, ContextKind, FnContext, Typer};
use crate::error::{CompileError, CompileResult};
use crate::hir::{FunctionRole, HirId, HirKind, VarKind};
use crate::lattice::{ClassRef, Lattice};
use crate::scope::Frame;

impl Typer<'_> {
    /// `(def name [params] body?)`
    pub(super) fn type_def(&mut self, node: &Node) -> CompileResult<HirId> {
        let line = node.line;
        let name = expect_sym(node, 0)?;
        let (owner, opening) = match &self.current.kind {
            ContextKind::Method => {
                return Err(CompileError::unsupported("nested method definition", line))
            }
            _ if self.current.loop_depth > 0 => {
                return Err(CompileError::unsupported(
                    "method definition inside a loop",
                    line,
                ))
            }
            ContextKind::ClassBody { class, serial } => (Some(class.clone()), Some(*serial)),
            ContextKind::TopLevel => (None, None),
        };
        let param_names = node
            .sym_list(1)
            .ok_or_else(|| CompileError::malformed(node.kind, line, "expected a parameter list"))?;
        let arity = param_names.len();

        let mut bindings = Vec::with_capacity(arity);
        for param in &param_names {
            if bindings.iter().any(|(n, _): &(String, _)| n.as_str() == *param) {
                return Err(CompileError::malformed(
                    node.kind,
                    line,
                    format!("duplicate parameter {}", param),
                ));
            }
            let var = self.session.vars.alloc(*param, VarKind::Param, Lattice::Unknown);
            bindings.push((param.to_string(), var));
        }
        let self_lattice = match &owner {
            Some(class) => Lattice::set_of([ClassRef::user(class.clone())]),
            None => Lattice::Dynamic,
        };
        let frame = Frame::root(bindings, owner.clone(), self_lattice);

        let outer = mem::replace(&mut self.current, FnContext::new(ContextKind::Method));
        let body = match node.node(2) {
            Some(body) => self.type_node(&frame, body),
            None => Ok(self.empty(line)),
        };
        let finished = body.and_then(|body| self.finish_function(body, line));
        self.current = outer;
        let (body, return_type) = finished?;

        let params = frame
            .locals()
            .iter()
            .map(|(_, var)| {
                let lattice = self.session.vars.lattice(*var).clone();
                self.alloc(HirKind::ParamDecl { var: *var }, lattice, line)
            })
            .collect();
        debug!(
            method = name,
            owner = owner.as_deref().unwrap_or("<top>"),
            arity,
            return_type = %return_type,
            "typed method"
        );
        let decl = self.alloc(
            HirKind::FunctionDecl {
                role: FunctionRole::Method {
                    owner: owner.clone(),
                    opening,
                },
                name: name.to_string(),
                params,
                body,
                return_type: return_type.clone(),
            },
            return_type,
            line,
        );
        self.session.define_method(owner, opening, name, arity, decl);
        if matches!(self.current.kind, ContextKind::ClassBody { .. }) {
            self.current.defined.push((name.to_string(), arity));
        }
        Ok(self.empty(line))
    }

    /// `(class Name super? body?)`
    pub(super) fn type_class(&mut self, node: &Node) -> CompileResult<HirId> {
        let line = node.line;
        let name = match node.child(0) {
            Some(Child::Sym(name)) => name.as_str(),
            Some(Child::Node(path)) if path.kind == NodeKind::Const => expect_sym(path, 0)?,
            _ => {
                return Err(CompileError::malformed(
                    node.kind,
                    line,
                    "expected a class name",
                ))
            }
        };
        if node.node(1).is_some() {
            return Err(CompileError::unsupported(
                format!("superclass for class {}", name),
                line,
            ));
        }
        if self.current.kind != ContextKind::TopLevel || self.current.loop_depth > 0 {
            return Err(CompileError::unsupported(
                format!("class {} defined inside a method, class or loop", name),
                line,
            ));
        }

        let class_object = Lattice::class_object(ClassRef::user(name));
        let constant = self.session.lookup_constant(name, line);
        let current = self.session.vars.lattice(constant);
        if !current.is_unknown() && current != &class_object {
            return Err(CompileError::unsupported(
                format!("class {} reopens a constant that is not a class", name),
                line,
            ));
        }
        self.session.vars.widen(constant, &class_object);
        let serial = self.session.open_class(name);

        let frame = Frame::root(Vec::new(), Some(name.to_string()), class_object.clone());
        let outer = mem::replace(
            &mut self.current,
            FnContext::new(ContextKind::ClassBody {
                class: name.to_string(),
                serial,
            }),
        );
        let body = match node.node(2) {
            Some(body) => self.type_node(&frame, body),
            None => Ok(self.empty(line)),
        };
        let finished = body.and_then(|body| self.finish_function(body, line));
        let inner = mem::replace(&mut self.current, outer);
        let (body, return_type) = finished?;

        let initializer = self.alloc(
            HirKind::FunctionDecl {
                role: FunctionRole::ClassInit {
                    class: name.to_string(),
                    serial,
                },
                name: name.to_string(),
                params: Vec::new(),
                body,
                return_type: return_type.clone(),
            },
            return_type,
            line,
        );
        debug!(class = name, serial, methods = inner.defined.len(), "typed class body");
        let def = self.alloc(
            HirKind::DefClass {
                name: name.to_string(),
                serial,
                methods: inner.defined,
                initializer,
            },
            class_object.clone(),
            line,
        );
        self.session.add_class_def(def, initializer);
        Ok(self.alloc(
            HirKind::Assign {
                target: constant,
                value: def,
            },
            class_object,
            line,
        ))
    }

    /// Insert returns at the tails of a typed body and declare the current
    /// function's temporaries. Returns the new body and the join of every
    /// value it may return.
    pub(super) fn finish_function(
        &mut self,
        body: HirId,
        line: u32,
    ) -> CompileResult<(HirId, Lattice)> {
        let body = self.insert_returns(body)?;
        let return_type = self.return_type(body);
        if self.current.temps.is_empty() {
            return Ok((body, return_type));
        }
        let temps = mem::take(&mut self.current.temps);
        let decls = temps
            .into_iter()
            .map(|var| {
                let lattice = self.session.vars.lattice(var).clone();
                self.alloc(HirKind::LocalDecl { var, init: None }, lattice, line)
            })
            .collect();
        let lattice = self.lattice_of(body);
        Ok((self.alloc(HirKind::Scope { decls, body }, lattice, line), return_type))
    }

    /// Rewrite the tail position of `id` so every path ends in a return.
    fn insert_returns(&mut self, id: HirId) -> CompileResult<HirId> {
        let node = self.session.hir[id].clone();
        let line = node.line;
        let lattice = node.lattice.clone();
        match node.kind {
            HirKind::Block(mut stmts) => match stmts.pop() {
                Some(last) => {
                    let last = self.insert_returns(last)?;
                    stmts.push(last);
                    Ok(self.alloc(HirKind::Block(stmts), lattice, line))
                }
                None => Ok(self.return_nil(line)),
            },
            HirKind::Scope { decls, body } => {
                let body = self.insert_returns(body)?;
                Ok(self.alloc(HirKind::Scope { decls, body }, lattice, line))
            }
            HirKind::IfElse {
                cond,
                then_branch,
                else_branch,
            } => {
                let then_branch = self.insert_returns(then_branch)?;
                let else_branch = match else_branch {
                    Some(e) => self.insert_returns(e)?,
                    None => self.return_nil(line),
                };
                Ok(self.alloc(
                    HirKind::IfElse {
                        cond,
                        then_branch,
                        else_branch: Some(else_branch),
                    },
                    lattice,
                    line,
                ))
            }
            HirKind::Assign { target, .. } => {
                let value = self.read_var(target, line);
                let ret = self.alloc(HirKind::Return(Some(value)), lattice.clone(), line);
                Ok(self.alloc(HirKind::Block(vec![id, ret]), lattice, line))
            }
            HirKind::While { .. }
            | HirKind::GlobalDecl { .. }
            | HirKind::LocalDecl { .. }
            | HirKind::ParamDecl { .. }
            | HirKind::FunctionDecl { .. } => {
                let ret = self.return_nil(line);
                Ok(self.alloc(HirKind::Block(vec![id, ret]), Lattice::nil(), line))
            }
            HirKind::Return(_) => Ok(id),
            HirKind::Break | HirKind::Continue => Err(CompileError::unsupported(
                "loop jump in tail position",
                line,
            )),
            HirKind::Empty => Ok(self.return_nil(line)),
            HirKind::DefClass { .. }
            | HirKind::CountedLoop { .. }
            | HirKind::Literal(_)
            | HirKind::Var(_)
            | HirKind::SelfRef
            | HirKind::Call { .. }
            | HirKind::CondOp { .. } => Ok(self.alloc(HirKind::Return(Some(id)), lattice, line)),
        }
    }

    fn return_nil(&mut self, line: u32) -> HirId {
        self.alloc(HirKind::Return(None), Lattice::nil(), line)
    }

    /// Join of the lattices of every return reachable from `body`.
    fn return_type(&self, body: HirId) -> Lattice {
        let mut result = Lattice::Unknown;
        let mut stack = vec![body];
        while let Some(id) = stack.pop() {
            let node = &self.session.hir[id];
            match &node.kind {
                HirKind::Return(Some(_)) => {
                    result.join_in_place(&node.lattice);
                }
                HirKind::Return(None) => {
                    result.join_in_place(&Lattice::nil());
                }
                _ => {}
            }
            stack.extend(node.kind.children());
        }
        result
    }
}
