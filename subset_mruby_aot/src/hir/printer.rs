//! Indented text dump of HIR trees with their lattice annotations.
//!
//! ```text
//! (function foo/1 [a] -> <dynamic>
//!   (scope
//!     (return (call mux foo/0 (self : {A}) : <dynamic>))))
//! ```

use super::{Callee, FunctionRole, HirArena, HirId, HirKind, Literal, VarArena};

/// Printer over one session's arenas.
#[derive(Debug)]
pub struct HirPrinter<'a> {
    hir: &'a HirArena,
    vars: &'a VarArena,
    out: String,
}

impl<'a> HirPrinter<'a> {
    pub fn new(hir: &'a HirArena, vars: &'a VarArena) -> Self {
        Self {
            hir,
            vars,
            out: String::new(),
        }
    }

    /// Render one tree.
    pub fn render(mut self, id: HirId) -> String {
        self.node(id, 0);
        self.out
    }

    /// Render several trees separated by blank lines.
    pub fn render_all(mut self, ids: &[HirId]) -> String {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                self.out.push_str("\n\n");
            }
            self.node(*id, 0);
        }
        self.out.push('\n');
        self.out
    }

    fn newline(&mut self, depth: usize) {
        self.out.push('\n');
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    fn var(&self, id: super::VarId) -> String {
        let v = &self.vars[id];
        format!("{} : {}", v.name, v.lattice)
    }

    fn children(&mut self, ids: &[HirId], depth: usize) {
        for id in ids {
            self.newline(depth);
            self.node(*id, depth);
        }
    }

    fn inline(&mut self, ids: &[HirId], depth: usize) {
        for id in ids {
            self.out.push(' ');
            self.node(*id, depth);
        }
    }

    fn node(&mut self, id: HirId, depth: usize) {
        let hir = self.hir;
        let vars = self.vars;
        let node = &hir[id];
        let lattice = node.lattice.to_string();
        match &node.kind {
            HirKind::GlobalDecl { var } => {
                let text = format!("(global {})", self.var(*var));
                self.out.push_str(&text);
            }
            HirKind::LocalDecl { var, init } => {
                let text = format!("(local {}", self.var(*var));
                self.out.push_str(&text);
                if let Some(init) = init {
                    self.out.push(' ');
                    self.node(*init, depth + 1);
                }
                self.out.push(')');
            }
            HirKind::ParamDecl { var } => {
                let text = format!("(param {})", self.var(*var));
                self.out.push_str(&text);
            }
            HirKind::FunctionDecl {
                role,
                name,
                params,
                body,
                return_type,
            } => {
                let owner = match role {
                    FunctionRole::Method {
                        owner: Some(class), ..
                    } => format!("{}#", class),
                    FunctionRole::Method { owner: None, .. } => String::new(),
                    FunctionRole::ClassInit { class, serial } => format!("<{}:{}>", class, serial),
                    FunctionRole::Main => "<main>".to_string(),
                };
                let text = format!("(function {}{}/{}", owner, name, params.len());
                self.out.push_str(&text);
                self.inline(params, depth + 1);
                let text = format!(" -> {}", return_type);
                self.out.push_str(&text);
                self.newline(depth + 1);
                self.node(*body, depth + 1);
                self.out.push(')');
            }
            HirKind::Block(stmts) => {
                self.out.push_str("(block");
                self.children(stmts, depth + 1);
                self.out.push(')');
            }
            HirKind::Scope { decls, body } => {
                self.out.push_str("(scope");
                self.children(decls, depth + 1);
                self.newline(depth + 1);
                self.node(*body, depth + 1);
                self.out.push(')');
            }
            HirKind::Assign { target, value } => {
                let text = format!("(assign {} ", self.var(*target));
                self.out.push_str(&text);
                self.node(*value, depth + 1);
                self.out.push(')');
            }
            HirKind::IfElse {
                cond,
                then_branch,
                else_branch,
            } => {
                self.out.push_str("(if ");
                self.node(*cond, depth + 1);
                self.newline(depth + 1);
                self.node(*then_branch, depth + 1);
                if let Some(else_branch) = else_branch {
                    self.newline(depth + 1);
                    self.node(*else_branch, depth + 1);
                }
                let text = format!(" : {})", lattice);
                self.out.push_str(&text);
            }
            HirKind::CountedLoop {
                var,
                low,
                high,
                body,
            } => {
                let text = format!("(for {} ", self.var(*var));
                self.out.push_str(&text);
                self.node(*low, depth + 1);
                self.out.push(' ');
                self.node(*high, depth + 1);
                self.newline(depth + 1);
                self.node(*body, depth + 1);
                self.out.push(')');
            }
            HirKind::While { cond, body } => {
                self.out.push_str("(while ");
                self.node(*cond, depth + 1);
                self.newline(depth + 1);
                self.node(*body, depth + 1);
                self.out.push(')');
            }
            HirKind::Break => self.out.push_str("(break)"),
            HirKind::Continue => self.out.push_str("(continue)"),
            HirKind::Return(value) => {
                self.out.push_str("(return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.node(*value, depth + 1);
                }
                self.out.push(')');
            }
            HirKind::DefClass {
                name,
                serial,
                methods,
                ..
            } => {
                let names: Vec<String> = methods
                    .iter()
                    .map(|(m, arity)| format!("{}/{}", m, arity))
                    .collect();
                let text = format!("(defclass {}:{} [{}])", name, serial, names.join(" "));
                self.out.push_str(&text);
            }
            HirKind::Empty => self.out.push_str("(empty)"),
            HirKind::Literal(lit) => {
                let text = match lit {
                    Literal::Int { text, base, .. } if *base != 10 => {
                        format!("(int {}#{} : {})", text, base, lattice)
                    }
                    Literal::Int { text, .. } => format!("(int {} : {})", text, lattice),
                    Literal::Float { text, .. } => format!("(float {} : {})", text, lattice),
                    Literal::Str { text, .. } => format!("(str {:?})", text),
                    Literal::Nil => "(nil)".to_string(),
                    Literal::True => "(true)".to_string(),
                    Literal::False => "(false)".to_string(),
                };
                self.out.push_str(&text);
            }
            HirKind::Var(var) => {
                let name = &vars[*var].name;
                let text = format!("({} : {})", name, lattice);
                self.out.push_str(&text);
            }
            HirKind::SelfRef => {
                let text = format!("(self : {})", lattice);
                self.out.push_str(&text);
            }
            HirKind::Call { callee, args } => {
                let head = match callee {
                    Callee::Prim(op) => format!("(call {}", op.runtime_name()),
                    Callee::Dispatch(name) => {
                        format!("(call mux {}/{}", name, args.len().saturating_sub(1))
                    }
                    Callee::Construct => {
                        format!("(call new/{}", args.len().saturating_sub(1))
                    }
                };
                self.out.push_str(&head);
                self.inline(args, depth + 1);
                let text = format!(" : {})", lattice);
                self.out.push_str(&text);
            }
            HirKind::CondOp {
                cond,
                then_value,
                else_value,
            } => {
                self.out.push_str("(cond");
                self.inline(&[*cond, *then_value, *else_value], depth + 1);
                let text = format!(" : {})", lattice);
                self.out.push_str(&text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{PrimOp, VarKind};
    use crate::lattice::{BuiltinClass, Lattice};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_scope() {
        let mut hir = HirArena::new();
        let mut vars = VarArena::new();
        let x = vars.alloc("x", VarKind::Local, Lattice::int(1));
        let decl = hir.alloc(HirKind::LocalDecl { var: x, init: None }, Lattice::int(1), 1);
        let one = hir.alloc(
            HirKind::Literal(Literal::Int {
                text: "1".to_string(),
                base: 10,
                value: 1,
            }),
            Lattice::int(1),
            1,
        );
        let assign = hir.alloc(HirKind::Assign { target: x, value: one }, Lattice::int(1), 1);
        let read = hir.alloc(HirKind::Var(x), Lattice::int(1), 2);
        let sum_type = Lattice::set_of([BuiltinClass::Integer, BuiltinClass::Float]);
        let add = hir.alloc(
            HirKind::Call {
                callee: Callee::Prim(PrimOp::NumAdd),
                args: vec![read, one],
            },
            sum_type,
            2,
        );
        let block = hir.alloc(HirKind::Block(vec![assign, add]), Lattice::Unknown, 1);
        let scope = hir.alloc(
            HirKind::Scope {
                decls: vec![decl],
                body: block,
            },
            Lattice::Unknown,
            1,
        );

        let text = HirPrinter::new(&hir, &vars).render(scope);
        assert_eq!(
            text,
            "(scope\n  (local x : 1)\n  (block\n    (assign x : 1 (int 1 : 1))\n    \
             (call num_add (x : 1) (int 1 : 1) : {Integer, Float})))"
        );
    }
}
