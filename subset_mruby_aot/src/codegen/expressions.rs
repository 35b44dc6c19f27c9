use super::names::{c_string, class_ptr, constructor_fn, define_class_fn, local_name, mux_fn};
use super::CGenerator;
use crate::error::{CompileError, CompileResult};
use crate::hir::{Callee, HirId, HirKind, Literal, PrimOp, VarId, VarKind};

/// `mrb_intern_lit` call for a fixed name.
fn intern(name: &str) -> String {
    format!("mrb_intern_lit(mrb, {})", c_string(name))
}

const OBJECT: &str = "mrb_obj_value(mrb->object_class)";

/// C expression for an integer literal.
fn int_literal(value: i64, base: u32) -> String {
    if value == i64::MIN {
        return "(-9223372036854775807 - 1)".to_string();
    }
    match base {
        16 if value >= 0 => format!("0x{:x}", value),
        8 if value > 0 => format!("0{:o}", value),
        _ => value.to_string(),
    }
}

/// C expression for a float literal.
fn float_literal(text: &str, value: f64) -> String {
    if value.is_nan() {
        "(0.0 / 0.0)".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "(1.0 / 0.0)".to_string()
        } else {
            "(-1.0 / 0.0)".to_string()
        }
    } else {
        text.to_string()
    }
}

impl CGenerator<'_> {
    /// Emit `id` as a C expression of type `mrb_value`.
    pub(super) fn expr(&mut self, id: HirId) -> CompileResult<String> {
        let session = self.session;
        if self.needs_hoisting(id) {
            return self.hoist(id);
        }
        match session.hir.kind(id) {
            HirKind::Literal(literal) => Ok(match literal {
                Literal::Int { value, base, .. } => {
                    format!("mrb_fixnum_value({})", int_literal(*value, *base))
                }
                Literal::Float { text, value } => {
                    format!("mrb_float_value(mrb, {})", float_literal(text, *value))
                }
                Literal::Str { text, len } => {
                    format!("mrb_str_new(mrb, {}, {})", c_string(text), len)
                }
                Literal::Nil => "mrb_nil_value()".to_string(),
                Literal::True => "mrb_true_value()".to_string(),
                Literal::False => "mrb_false_value()".to_string(),
            }),
            HirKind::Var(var) => Ok(self.load(*var)),
            HirKind::SelfRef => Ok("self".to_string()),
            HirKind::Empty => Ok("mrb_nil_value()".to_string()),
            HirKind::Call { callee, args } => self.call(callee, args),
            HirKind::CondOp {
                cond,
                then_value,
                else_value,
            } => {
                let cond = self.expr(*cond)?;
                let then_value = self.expr(*then_value)?;
                let else_value = self.expr(*else_value)?;
                Ok(format!(
                    "(mrb_test({}) ? {} : {})",
                    cond, then_value, else_value
                ))
            }
            HirKind::IfElse {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.expr(*cond)?;
                let then_value = self.expr(*then_branch)?;
                let else_value = match else_branch {
                    Some(e) => self.expr(*e)?,
                    None => "mrb_nil_value()".to_string(),
                };
                Ok(format!(
                    "(mrb_test({}) ? {} : {})",
                    cond, then_value, else_value
                ))
            }
            HirKind::Assign { target, value } => {
                let value = self.expr(*value)?;
                Ok(self.store(*target, &value, true))
            }
            HirKind::Block(stmts) => match stmts.as_slice() {
                [] => Ok("mrb_nil_value()".to_string()),
                [single] => self.expr(*single),
                _ => {
                    let parts = stmts
                        .iter()
                        .map(|s| self.expr(*s))
                        .collect::<CompileResult<Vec<_>>>()?;
                    Ok(format!("({})", parts.join(", ")))
                }
            },
            HirKind::Scope { decls, body } if decls.is_empty() => self.expr(*body),
            HirKind::DefClass { name, serial, .. } => {
                Ok(format!("{}(mrb)", define_class_fn(name, *serial)))
            }
            other => Err(CompileError::Codegen(format!(
                "line {}: statement used as a value: {:?}",
                session.hir[id].line,
                other
            ))),
        }
    }

    /// Whether `id` has no expression form: it is a statement, or an
    /// expression form would run a statement inside it conditionally or out
    /// of order.
    fn needs_hoisting(&self, id: HirId) -> bool {
        match self.session.hir.kind(id) {
            HirKind::Block(_)
            | HirKind::Scope { .. }
            | HirKind::IfElse { .. }
            | HirKind::CondOp { .. } => self.contains_statement(id),
            HirKind::CountedLoop { .. }
            | HirKind::While { .. }
            | HirKind::Break
            | HirKind::Continue
            | HirKind::Return(_)
            | HirKind::LocalDecl { .. } => true,
            _ => false,
        }
    }

    /// Whether `id` or any node below it only has a statement form.
    pub(super) fn contains_statement(&self, id: HirId) -> bool {
        let hir = &self.session.hir;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let kind = hir.kind(id);
            match kind {
                HirKind::CountedLoop { .. }
                | HirKind::While { .. }
                | HirKind::Break
                | HirKind::Continue
                | HirKind::Return(_)
                | HirKind::LocalDecl { .. } => return true,
                _ => stack.extend(kind.children()),
            }
        }
        false
    }

    /// Compute `id` by statements into a fresh local and use the local.
    fn hoist(&mut self, id: HirId) -> CompileResult<String> {
        let temp = format!("_v{}", self.value_counter);
        self.value_counter += 1;
        self.write_line(&format!("mrb_value {} = mrb_nil_value();", temp));
        self.emit_value_into(id, &temp)?;
        Ok(temp)
    }

    /// Read of a variable.
    fn load(&self, var: VarId) -> String {
        let vars = &self.session.vars;
        let name = vars.name(var);
        match vars.kind(var) {
            VarKind::Local | VarKind::Param => local_name(name),
            VarKind::Instance => format!("mrb_iv_get(mrb, self, {})", intern(name)),
            VarKind::Global => format!("mrb_gv_get(mrb, {})", intern(name)),
            VarKind::Constant => format!("mrb_const_get(mrb, {}, {})", OBJECT, intern(name)),
            VarKind::ClassLevel => format!(
                "mrb_cv_get(mrb, {}, {})",
                self.class_var_holder(var),
                intern(name)
            ),
        }
    }

    /// Write of a variable. In expression position the value-returning
    /// runtime helpers are used so the store yields the assigned value.
    pub(super) fn store(&self, var: VarId, value: &str, as_expr: bool) -> String {
        let vars = &self.session.vars;
        let name = vars.name(var);
        match (vars.kind(var), as_expr) {
            (VarKind::Local | VarKind::Param, false) => format!("{} = {}", local_name(name), value),
            (VarKind::Local | VarKind::Param, true) => format!("({} = {})", local_name(name), value),
            (VarKind::Instance, false) => {
                format!("mrb_iv_set(mrb, self, {}, {})", intern(name), value)
            }
            (VarKind::Instance, true) => {
                format!("hpc_iv_set(mrb, self, {}, {})", intern(name), value)
            }
            (VarKind::Global, false) => format!("mrb_gv_set(mrb, {}, {})", intern(name), value),
            (VarKind::Global, true) => format!("hpc_gv_set(mrb, {}, {})", intern(name), value),
            (VarKind::Constant, false) => format!(
                "mrb_const_set(mrb, {}, {}, {})",
                OBJECT,
                intern(name),
                value
            ),
            (VarKind::Constant, true) => format!(
                "hpc_const_set(mrb, {}, {}, {})",
                OBJECT,
                intern(name),
                value
            ),
            (VarKind::ClassLevel, false) => format!(
                "mrb_cv_set(mrb, {}, {}, {})",
                self.class_var_holder(var),
                intern(name),
                value
            ),
            (VarKind::ClassLevel, true) => format!(
                "hpc_cv_set(mrb, {}, {}, {})",
                self.class_var_holder(var),
                intern(name),
                value
            ),
        }
    }

    fn class_var_holder(&self, var: VarId) -> String {
        match self.session.class_var_owner(var) {
            Some(class) => format!("mrb_obj_value({})", class_ptr(class)),
            None => OBJECT.to_string(),
        }
    }

    fn call(&mut self, callee: &Callee, args: &[HirId]) -> CompileResult<String> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.expr(*arg)?);
        }
        Ok(match callee {
            Callee::Prim(PrimOp::AryNew) => {
                self.stats.fast_path_calls += 1;
                if values.is_empty() {
                    "mrb_ary_new(mrb)".to_string()
                } else {
                    format!(
                        "{}(mrb, {}, (mrb_value[]){{{}}})",
                        PrimOp::AryNew.runtime_name(),
                        values.len(),
                        values.join(", ")
                    )
                }
            }
            Callee::Prim(op) => {
                self.stats.fast_path_calls += 1;
                format!("{}(mrb, {})", op.runtime_name(), values.join(", "))
            }
            Callee::Dispatch(name) => {
                self.stats.dispatched_calls += 1;
                let argc = values.len().saturating_sub(1);
                format!("{}(mrb, {})", mux_fn(name, argc), values.join(", "))
            }
            Callee::Construct => {
                self.stats.constructor_calls += 1;
                let argc = values.len().saturating_sub(1);
                format!("{}(mrb, {})", constructor_fn(argc), values.join(", "))
            }
        })
    }
}
