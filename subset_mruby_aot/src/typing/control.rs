//! Control flow typing.
//!
//! Conditional arms are typed in parallel frames and merged. Loop bodies are
//! retyped until the lattices of every visible binding stop changing; past
//! the configured iteration limit the bindings that still change are widened
//! to dynamic.
//!
//! Instance variables live on the object rather than in a frame, so arms
//! share them. One that only gets a value in code that may not run can
//! still hold whatever the object had, and is made dynamic.

use subset_mruby_ast::Node;
use tracing::trace;

use super::{expect_node, Typer};
use crate::error::{CompileError, CompileResult};
use crate::hir::{HirId, HirKind, VarId};
use crate::lattice::Lattice;
use crate::scope::{merge_lattices, Frame};

impl Typer<'_> {
    /// `(if cond then? else?)`; `unless` swaps the arms.
    pub(super) fn type_if(
        &mut self,
        frame: &Frame<'_>,
        node: &Node,
        negated: bool,
    ) -> CompileResult<HirId> {
        let line = node.line;
        let cond = self.type_node(frame, expect_node(node, 0)?)?;
        let (then_node, else_node) = if negated {
            (node.node(2), node.node(1))
        } else {
            (node.node(1), node.node(2))
        };

        let assigned = self.assigned_ivars(frame);
        let branch = frame.duplicate(&mut self.session.vars);
        let then_branch = match then_node {
            Some(n) => self.type_node(frame, n)?,
            None => self.empty(line),
        };
        self.settle_ivars(frame, &assigned);
        let else_branch = match else_node {
            Some(n) => Some(self.type_node(&branch, n)?),
            None => None,
        };
        self.settle_ivars(frame, &assigned);
        frame.merge(branch, &mut self.session.vars);

        let then_lattice = self.lattice_of(then_branch);
        let else_lattice = match else_branch {
            Some(id) => self.lattice_of(id),
            None => Lattice::nil(),
        };
        let lattice = merge_lattices(&then_lattice, &else_lattice);
        Ok(self.alloc(
            HirKind::IfElse {
                cond,
                then_branch,
                else_branch,
            },
            lattice,
            line,
        ))
    }

    /// `(while cond body)`; `until` negates the condition.
    pub(super) fn type_while(
        &mut self,
        frame: &Frame<'_>,
        node: &Node,
        negated: bool,
    ) -> CompileResult<HirId> {
        let line = node.line;
        let cond_node = expect_node(node, 0)?;
        let (cond, body) = self.type_loop(frame, line, |typer| {
            let cond = if negated {
                typer.type_send(frame, Some(cond_node), "!", &[], line)?
            } else {
                typer.type_node(frame, cond_node)?
            };
            let body = match node.node(1) {
                Some(body) => typer.type_node(frame, body)?,
                None => typer.empty(line),
            };
            Ok((cond, body))
        })?;
        Ok(self.alloc(HirKind::While { cond, body }, Lattice::nil(), line))
    }

    /// Run `type_once` until the frame's lattices reach a fixed point.
    ///
    /// Only the last round's HIR is kept.
    pub(super) fn type_loop<R>(
        &mut self,
        frame: &Frame<'_>,
        line: u32,
        mut type_once: impl FnMut(&mut Self) -> CompileResult<R>,
    ) -> CompileResult<R> {
        let assigned = self.assigned_ivars(frame);
        let mut rounds = 0;
        loop {
            let before = frame.lattice_snapshot(&self.session.vars);
            let temps = self.current.temps.len();

            self.current.loop_depth += 1;
            let result = type_once(self);
            self.current.loop_depth -= 1;
            let result = result?;
            self.session.stats.loop_iterations += 1;
            self.settle_ivars(frame, &assigned);

            let after = frame.lattice_snapshot(&self.session.vars);
            if before == after {
                trace!(line, rounds, "loop reached a fixed point");
                return Ok(result);
            }

            rounds += 1;
            if rounds >= self.max_loop_iterations {
                let mut widened = 0;
                for (i, var) in frame.snapshot_vars().into_iter().enumerate() {
                    let changed = before.get(i) != after.get(i);
                    if changed && !self.session.vars.lattice(var).is_dynamic() {
                        self.session.vars.set_lattice(var, Lattice::Dynamic);
                        widened += 1;
                    }
                }
                self.session.stats.widened_variables += widened;
                self.session.warn(format!(
                    "line {}: loop did not converge after {} iterations; {} variable(s) widened to dynamic",
                    line, rounds, widened
                ));
            }
            self.current.temps.truncate(temps);
        }
    }

    /// `(break)` / `(next)`; values are not supported.
    pub(super) fn type_jump(&mut self, node: &Node, kind: HirKind) -> CompileResult<HirId> {
        let line = node.line;
        let keyword = if kind == HirKind::Break { "break" } else { "next" };
        if node.node(0).is_some() {
            return Err(CompileError::unsupported(
                format!("{} with a value", keyword),
                line,
            ));
        }
        if self.current.loop_depth == 0 {
            return Err(CompileError::unsupported(
                format!("{} outside of a loop", keyword),
                line,
            ));
        }
        Ok(self.alloc(kind, Lattice::nil(), line))
    }

    /// `(return value?)`
    pub(super) fn type_return(&mut self, frame: &Frame<'_>, node: &Node) -> CompileResult<HirId> {
        let line = node.line;
        match node.node(0) {
            Some(value) => {
                let value = self.type_node(frame, value)?;
                let lattice = self.lattice_of(value);
                Ok(self.alloc(HirKind::Return(Some(value)), lattice, line))
            }
            None => Ok(self.alloc(HirKind::Return(None), Lattice::nil(), line)),
        }
    }

    /// `(and lhs rhs)` / `(or lhs rhs)` as a conditional expression.
    ///
    /// The left operand is evaluated once; unless it is trivially
    /// re-readable it is stored in a temporary first.
    pub(super) fn type_logical(
        &mut self,
        frame: &Frame<'_>,
        node: &Node,
        is_and: bool,
    ) -> CompileResult<HirId> {
        let line = node.line;
        let lhs = self.type_node(frame, expect_node(node, 0)?)?;

        let assigned = self.assigned_ivars(frame);
        let branch = frame.duplicate(&mut self.session.vars);
        let rhs = self.type_node(&branch, expect_node(node, 1)?)?;
        self.settle_ivars(frame, &assigned);
        frame.merge(branch, &mut self.session.vars);

        let lhs_lattice = self.lattice_of(lhs);
        let rhs_lattice = self.lattice_of(rhs);
        let lattice = lhs_lattice.join(&rhs_lattice);

        let (prefix, left) = if self.is_rereadable(lhs) {
            (None, lhs)
        } else {
            let temp = self.new_temp("cond");
            self.session.vars.widen(temp, &lhs_lattice);
            let assign = self.alloc(
                HirKind::Assign {
                    target: temp,
                    value: lhs,
                },
                lhs_lattice.clone(),
                line,
            );
            (Some(assign), self.alloc(HirKind::Var(temp), lhs_lattice, line))
        };

        let (then_value, else_value) = if is_and { (rhs, left) } else { (left, rhs) };
        let select = self.alloc(
            HirKind::CondOp {
                cond: left,
                then_value,
                else_value,
            },
            lattice.clone(),
            line,
        );
        Ok(match prefix {
            Some(assign) => self.alloc(HirKind::Block(vec![assign, select]), lattice, line),
            None => select,
        })
    }

    /// Instance variables that already hold a value.
    fn assigned_ivars(&self, frame: &Frame<'_>) -> Vec<VarId> {
        frame
            .ivars()
            .into_iter()
            .filter(|id| !self.session.vars.lattice(*id).is_unknown())
            .collect()
    }

    /// Make dynamic every instance variable given its first value since
    /// `assigned` was taken.
    fn settle_ivars(&mut self, frame: &Frame<'_>, assigned: &[VarId]) {
        for id in frame.ivars() {
            if !assigned.contains(&id) && !self.session.vars.lattice(id).is_unknown() {
                trace!(ivar = self.session.vars.name(id), "conditionally assigned");
                self.session.vars.set_lattice(id, Lattice::Dynamic);
            }
        }
    }

    fn is_rereadable(&self, id: HirId) -> bool {
        matches!(
            self.session.hir.kind(id),
            HirKind::Var(_) | HirKind::SelfRef | HirKind::Literal(_)
        )
    }
}
