//! Method call typing.
//!
//! A call is lowered to one of three callees:
//!
//! - a runtime primitive, when every operand is resolved to builtin classes
//!   the primitive handles ([`fast_path`]);
//! - a constructor dispatcher, for `C.new` with `C` a known user class;
//! - the multiplexer for `(name, argc)` otherwise, typed dynamic.
//!
//! `n.times { |i| ... }` on a receiver proven to be an Integer becomes a
//! counted loop.

use subset_mruby_ast::{Node, NodeKind};
use tracing::trace;

use super::{call_args, expect_sym, Typer};
use crate::error::{CompileError, CompileResult};
use crate::hir::{Callee, HirId, HirKind, PrimOp, VarKind};
use crate::lattice::{BuiltinClass, ClassRef, Lattice};
use crate::scope::Frame;

const NUMERIC: &[BuiltinClass] = &[BuiltinClass::Integer, BuiltinClass::Float];

/// Primitive implementing `name` for these operand lattices, with its result.
pub(crate) fn fast_path(name: &str, recv: &Lattice, args: &[Lattice]) -> Option<(PrimOp, Lattice)> {
    let numeric = |l: &Lattice| l.only_classes(NUMERIC);
    match (name, args) {
        ("+", [arg])
            if recv.only_classes(&[BuiltinClass::String])
                && arg.only_classes(&[BuiltinClass::String]) =>
        {
            Some((PrimOp::StrPlus, Lattice::set_of([BuiltinClass::String])))
        }
        ("+" | "-" | "*" | "/", [arg]) if numeric(recv) && numeric(arg) => {
            let op = match name {
                "+" => PrimOp::NumAdd,
                "-" => PrimOp::NumSub,
                "*" => PrimOp::NumMul,
                _ => PrimOp::NumDiv,
            };
            Some((op, arith_result(&[recv, arg])))
        }
        ("<" | "<=" | ">" | ">=" | "==", [arg]) if numeric(recv) && numeric(arg) => {
            let op = match name {
                "<" => PrimOp::NumLt,
                "<=" => PrimOp::NumLe,
                ">" => PrimOp::NumGt,
                ">=" => PrimOp::NumGe,
                _ => PrimOp::NumEq,
            };
            Some((op, Lattice::boolean()))
        }
        ("-@", []) if numeric(recv) => Some((PrimOp::NumNeg, arith_result(&[recv]))),
        ("!", []) if recv.only_builtin() => Some((PrimOp::Not, Lattice::boolean())),
        ("[]", [index])
            if recv.only_classes(&[BuiltinClass::Array])
                && index.only_classes(&[BuiltinClass::Integer]) =>
        {
            Some((PrimOp::AryGet, Lattice::Dynamic))
        }
        ("[]=", [index, value])
            if recv.only_classes(&[BuiltinClass::Array])
                && index.only_classes(&[BuiltinClass::Integer]) =>
        {
            Some((PrimOp::AryAset, value.clone()))
        }
        _ => None,
    }
}

/// Arithmetic may overflow into Float; it stays Integer only when every
/// operand may be one.
fn arith_result(operands: &[&Lattice]) -> Lattice {
    if operands.iter().all(|l| l.may_be(BuiltinClass::Integer)) {
        Lattice::set_of([BuiltinClass::Integer, BuiltinClass::Float])
    } else {
        Lattice::set_of([BuiltinClass::Float])
    }
}

impl Typer<'_> {
    /// `(call recv name [args] block?)` or `(fcall name [args] block?)`
    pub(super) fn type_call(&mut self, frame: &Frame<'_>, node: &Node) -> CompileResult<HirId> {
        let line = node.line;
        let is_fcall = node.kind == NodeKind::Fcall;
        let name_index = if is_fcall { 0 } else { 1 };
        let name = expect_sym(node, name_index)?;
        let args = call_args(node)?;
        let recv = if is_fcall { None } else { node.node(0) };

        if let Some(block) = node.node(name_index + 2) {
            if block.kind != NodeKind::Block {
                return Err(CompileError::unsupported(
                    format!("{} argument to {}", block.kind, name),
                    line,
                ));
            }
            return match (name, recv) {
                ("times", Some(recv)) if args.is_empty() => self.type_times(frame, recv, block),
                _ => Err(CompileError::unsupported(
                    format!("block passed to {}", name),
                    line,
                )),
            };
        }

        self.type_send(frame, recv, name, &args, line)
    }

    /// Type a message send. A missing receiver is `self`.
    pub(super) fn type_send(
        &mut self,
        frame: &Frame<'_>,
        recv: Option<&Node>,
        name: &str,
        args: &[&Node],
        line: u32,
    ) -> CompileResult<HirId> {
        let recv = match recv {
            Some(recv) => self.type_node(frame, recv)?,
            None => self.self_ref(frame, line),
        };
        let mut operands = vec![recv];
        for arg in args {
            operands.push(self.type_node(frame, arg)?);
        }
        self.send_typed(frame, name, operands, line)
    }

    /// Resolve a send whose receiver and arguments are already typed;
    /// `operands[0]` is the receiver.
    pub(super) fn send_typed(
        &mut self,
        frame: &Frame<'_>,
        name: &str,
        operands: Vec<HirId>,
        line: u32,
    ) -> CompileResult<HirId> {
        let recv = operands[0];
        let argc = operands.len() - 1;
        let recv_lattice = self.lattice_of(recv);
        let arg_lattices: Vec<Lattice> = operands[1..].iter().map(|id| self.lattice_of(*id)).collect();

        if name == "new" {
            if let Some(class) = recv_lattice.as_user_class() {
                let class = ClassRef::user(class);
                self.session.registry.note_constructor(argc);
                self.widen_ivars(frame);
                trace!(class = %class, argc, "constructor call");
                return Ok(self.alloc(
                    HirKind::Call {
                        callee: Callee::Construct,
                        args: operands,
                    },
                    Lattice::set_of([class]),
                    line,
                ));
            }
        }

        if let Some((op, result)) = fast_path(name, &recv_lattice, &arg_lattices) {
            trace!(method = name, op = op.runtime_name(), "fast path");
            return Ok(self.alloc(
                HirKind::Call {
                    callee: Callee::Prim(op),
                    args: operands,
                },
                result,
                line,
            ));
        }

        self.session.registry.note_call(name, argc);
        self.widen_ivars(frame);
        Ok(self.alloc(
            HirKind::Call {
                callee: Callee::Dispatch(name.to_string()),
                args: operands,
            },
            Lattice::Dynamic,
            line,
        ))
    }

    /// A dispatched call may run any method on `self`, so instance
    /// variables referenced so far lose what is known about them.
    fn widen_ivars(&mut self, frame: &Frame<'_>) {
        for ivar in frame.ivars() {
            self.session.vars.set_lattice(ivar, Lattice::Dynamic);
        }
    }

    /// `recv.times { |i| body }` as a counted loop over `0...recv`.
    fn type_times(&mut self, frame: &Frame<'_>, recv: &Node, block: &Node) -> CompileResult<HirId> {
        let line = block.line;
        let params = block
            .sym_list(0)
            .ok_or_else(|| CompileError::malformed(block.kind, line, "expected a parameter list"))?;
        if params.len() > 1 {
            return Err(CompileError::unsupported(
                "times block with more than one parameter",
                line,
            ));
        }

        let high = self.type_node(frame, recv)?;
        let count = self.lattice_of(high);
        if !count.only_classes(&[BuiltinClass::Integer]) {
            return Err(CompileError::unsupported(
                format!("times on a receiver of type {}", count),
                line,
            ));
        }
        let low = self.literal_int(0, line);

        let name = match params.first() {
            Some(name) => name.to_string(),
            None => self.session.fresh_temp("times"),
        };
        let counter_lattice = Lattice::set_of([BuiltinClass::Integer]);
        let var = self
            .session
            .vars
            .alloc(name.clone(), VarKind::Local, counter_lattice.clone());
        let bindings = if params.is_empty() {
            Vec::new()
        } else {
            vec![(name, var)]
        };
        let inner = Frame::new(frame, bindings);

        let body = self.type_loop(&inner, line, |typer| match block.node(1) {
            Some(body) => typer.type_node(&inner, body),
            None => Ok(typer.empty(line)),
        })?;

        let counted = self.alloc(
            HirKind::CountedLoop {
                var,
                low,
                high,
                body,
            },
            count.clone(),
            line,
        );
        let decl = self.alloc(
            HirKind::LocalDecl { var, init: None },
            counter_lattice,
            line,
        );
        Ok(self.alloc(
            HirKind::Scope {
                decls: vec![decl],
                body: counted,
            },
            count,
            line,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::ConstValue;

    #[test]
    fn test_integer_arith_may_overflow() {
        let int = Lattice::int(2);
        let (op, result) = fast_path("+", &int, &[Lattice::int(3)]).unwrap();
        assert_eq!(op, PrimOp::NumAdd);
        assert_eq!(
            result,
            Lattice::set_of([BuiltinClass::Integer, BuiltinClass::Float])
        );
    }

    #[test]
    fn test_mixed_arith_is_float() {
        let (op, result) = fast_path("*", &Lattice::int(2), &[Lattice::float(1.5)]).unwrap();
        assert_eq!(op, PrimOp::NumMul);
        assert_eq!(result, Lattice::set_of([BuiltinClass::Float]));
    }

    #[test]
    fn test_string_concat() {
        let (op, _) = fast_path("+", &Lattice::string("a"), &[Lattice::string("b")]).unwrap();
        assert_eq!(op, PrimOp::StrPlus);
        assert!(fast_path("+", &Lattice::string("a"), &[Lattice::int(1)]).is_none());
    }

    #[test]
    fn test_unresolved_operands_dispatch() {
        assert!(fast_path("+", &Lattice::Dynamic, &[Lattice::int(1)]).is_none());
        assert!(fast_path("+", &Lattice::int(1), &[Lattice::Unknown]).is_none());
        let user = Lattice::set_of([ClassRef::user("A")]);
        assert!(fast_path("!", &user, &[]).is_none());
        assert!(fast_path("foo", &Lattice::int(1), &[]).is_none());
    }

    #[test]
    fn test_comparisons_and_not() {
        let (op, result) = fast_path("<=", &Lattice::float(1.0), &[Lattice::int(1)]).unwrap();
        assert_eq!(op, PrimOp::NumLe);
        assert_eq!(result, Lattice::boolean());
        let (op, _) = fast_path("!", &Lattice::Constant(ConstValue::Nil), &[]).unwrap();
        assert_eq!(op, PrimOp::Not);
    }

    #[test]
    fn test_array_index() {
        let ary = Lattice::set_of([BuiltinClass::Array]);
        let (op, result) = fast_path("[]", &ary, &[Lattice::int(0)]).unwrap();
        assert_eq!(op, PrimOp::AryGet);
        assert!(result.is_dynamic());
        let (op, result) = fast_path("[]=", &ary, &[Lattice::int(0), Lattice::string("x")]).unwrap();
        assert_eq!(op, PrimOp::AryAset);
        assert_eq!(result, Lattice::string("x"));
        assert!(fast_path("[]", &ary, &[Lattice::string("k")]).is_none());
    }
}
