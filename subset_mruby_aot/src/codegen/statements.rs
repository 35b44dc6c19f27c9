use super::names::local_name;
use super::CGenerator;
use crate::error::CompileResult;
use crate::hir::{HirId, HirKind, VarId};

impl CGenerator<'_> {
    /// Emit `id` in statement position.
    pub(super) fn emit_stmt(&mut self, id: HirId) -> CompileResult<()> {
        let session = self.session;
        match session.hir.kind(id) {
            HirKind::Block(stmts) => {
                for stmt in stmts {
                    self.emit_stmt(*stmt)?;
                }
            }
            HirKind::Scope { decls, body } => {
                if decls.is_empty() {
                    return self.emit_stmt(*body);
                }
                self.write_line("{");
                self.indent();
                for decl in decls {
                    self.emit_decl(*decl)?;
                }
                self.emit_stmt(*body)?;
                self.dedent();
                self.write_line("}");
            }
            HirKind::Assign { target, value } => {
                let value = self.expr(*value)?;
                let line = self.store(*target, &value, false);
                self.write_line(&format!("{};", line));
            }
            HirKind::IfElse {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.expr(*cond)?;
                self.write_line(&format!("if (mrb_test({})) {{", cond));
                self.indent();
                self.emit_stmt(*then_branch)?;
                self.dedent();
                if let Some(else_branch) = else_branch {
                    self.write_line("} else {");
                    self.indent();
                    self.emit_stmt(*else_branch)?;
                    self.dedent();
                }
                self.write_line("}");
            }
            HirKind::CountedLoop {
                var,
                low,
                high,
                body,
            } => {
                let high = self.expr(*high)?;
                self.emit_counted_loop(*var, *low, &high, *body)?;
            }
            HirKind::While { cond, body } if self.contains_statement(*cond) => {
                self.write_line("for (;;) {");
                self.indent();
                let cond = self.expr(*cond)?;
                self.write_line(&format!("if (!mrb_test({})) break;", cond));
                self.emit_stmt(*body)?;
                self.dedent();
                self.write_line("}");
            }
            HirKind::While { cond, body } => {
                let cond = self.expr(*cond)?;
                self.write_line(&format!("while (mrb_test({})) {{", cond));
                self.indent();
                self.emit_stmt(*body)?;
                self.dedent();
                self.write_line("}");
            }
            HirKind::Break => self.write_line("break;"),
            HirKind::Continue => self.write_line("continue;"),
            HirKind::Return(Some(value)) => {
                let value = self.expr(*value)?;
                self.write_line(&format!("return {};", value));
            }
            HirKind::Return(None) => self.write_line("return mrb_nil_value();"),
            HirKind::LocalDecl { .. } => self.emit_decl(id)?,
            HirKind::GlobalDecl { .. }
            | HirKind::ParamDecl { .. }
            | HirKind::FunctionDecl { .. }
            | HirKind::Empty => {}
            HirKind::Literal(_) | HirKind::Var(_) | HirKind::SelfRef => {
                // no side effects
            }
            HirKind::CondOp {
                cond,
                then_value,
                else_value,
            } if self.contains_statement(id) => {
                let cond = self.expr(*cond)?;
                self.write_line(&format!("if (mrb_test({})) {{", cond));
                self.indent();
                self.emit_stmt(*then_value)?;
                self.dedent();
                self.write_line("} else {");
                self.indent();
                self.emit_stmt(*else_value)?;
                self.dedent();
                self.write_line("}");
            }
            HirKind::DefClass { .. } | HirKind::Call { .. } | HirKind::CondOp { .. } => {
                let expr = self.expr(id)?;
                self.write_line(&format!("{};", expr));
            }
        }
        Ok(())
    }

    /// `for` loop over `low...high`; `high` is evaluated once.
    pub(super) fn emit_counted_loop(
        &mut self,
        var: VarId,
        low: HirId,
        high: &str,
        body: HirId,
    ) -> CompileResult<()> {
        let k = format!("_k{}", self.loop_counter);
        let n = format!("_n{}", self.loop_counter);
        self.loop_counter += 1;
        let low = self.expr(low)?;
        self.write_line(&format!(
            "for (mrb_int {k} = mrb_fixnum({low}), {n} = mrb_fixnum({high}); {k} < {n}; {k}++) {{"
        ));
        self.indent();
        self.write_line(&format!(
            "{} = mrb_fixnum_value({});",
            local_name(self.session.vars.name(var)),
            k
        ));
        self.emit_stmt(body)?;
        self.dedent();
        self.write_line("}");
        self.stats.counted_loops += 1;
        Ok(())
    }

    /// Emit statements that leave the value of `id` in `dest`, a local
    /// that starts out nil.
    pub(super) fn emit_value_into(&mut self, id: HirId, dest: &str) -> CompileResult<()> {
        let session = self.session;
        match session.hir.kind(id) {
            HirKind::Block(stmts) => {
                if let Some((last, init)) = stmts.split_last() {
                    for stmt in init {
                        self.emit_stmt(*stmt)?;
                    }
                    self.emit_value_into(*last, dest)?;
                }
            }
            HirKind::Scope { decls, body } => {
                if decls.is_empty() {
                    return self.emit_value_into(*body, dest);
                }
                self.write_line("{");
                self.indent();
                for decl in decls {
                    self.emit_decl(*decl)?;
                }
                self.emit_value_into(*body, dest)?;
                self.dedent();
                self.write_line("}");
            }
            HirKind::IfElse {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.expr(*cond)?;
                self.write_line(&format!("if (mrb_test({})) {{", cond));
                self.indent();
                self.emit_value_into(*then_branch, dest)?;
                self.dedent();
                if let Some(else_branch) = else_branch {
                    self.write_line("} else {");
                    self.indent();
                    self.emit_value_into(*else_branch, dest)?;
                    self.dedent();
                }
                self.write_line("}");
            }
            HirKind::CondOp {
                cond,
                then_value,
                else_value,
            } => {
                let cond = self.expr(*cond)?;
                self.write_line(&format!("if (mrb_test({})) {{", cond));
                self.indent();
                self.emit_value_into(*then_value, dest)?;
                self.dedent();
                self.write_line("} else {");
                self.indent();
                self.emit_value_into(*else_value, dest)?;
                self.dedent();
                self.write_line("}");
            }
            // `n.times` yields its receiver
            HirKind::CountedLoop {
                var,
                low,
                high,
                body,
            } => {
                let count = self.expr(*high)?;
                if matches!(session.hir.kind(*high), HirKind::Literal(_)) {
                    self.emit_counted_loop(*var, *low, &count, *body)?;
                    self.write_line(&format!("{} = {};", dest, count));
                } else {
                    self.write_line(&format!("{} = {};", dest, count));
                    self.emit_counted_loop(*var, *low, dest, *body)?;
                }
            }
            HirKind::While { .. }
            | HirKind::Break
            | HirKind::Continue
            | HirKind::Return(_)
            | HirKind::GlobalDecl { .. }
            | HirKind::LocalDecl { .. }
            | HirKind::ParamDecl { .. }
            | HirKind::FunctionDecl { .. } => self.emit_stmt(id)?,
            _ => {
                let value = self.expr(id)?;
                self.write_line(&format!("{} = {};", dest, value));
            }
        }
        Ok(())
    }

    fn emit_decl(&mut self, decl: HirId) -> CompileResult<()> {
        let session = self.session;
        if let HirKind::LocalDecl { var, init } = session.hir.kind(decl) {
            let init = match init {
                Some(init) => self.expr(*init)?,
                None => "mrb_nil_value()".to_string(),
            };
            self.write_line(&format!(
                "mrb_value {} = {};",
                local_name(session.vars.name(*var)),
                init
            ));
        }
        Ok(())
    }
}
