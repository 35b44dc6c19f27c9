use super::names::{
    body_fn, c_string, class_init_fn, class_ptr, constructor_fn, define_class_fn, glue_fn,
    local_name, method_fn, mux_fn,
};
use super::CGenerator;
use crate::error::{CompileError, CompileResult};
use crate::hir::{FunctionRole, HirId, HirKind, VarKind};
use crate::lattice::Lattice;

/// Runtime headers every unit includes. `builtin.h` comes with the embedding
/// runtime and declares the primitives and value-returning stores called here.
const INCLUDES: &[&str] = &[
    "<mruby.h>",
    "<mruby/class.h>",
    "<mruby/string.h>",
    "<mruby/array.h>",
    "<mruby/variable.h>",
    "\"builtin.h\"",
];

/// Entry point called by the runtime with the top-level `self`.
pub const ENTRY_POINT: &str = "compiled_main";

/// Parameter list `mrb_value a0, mrb_value a1, ...`, with a leading comma.
fn value_params(names: &[String]) -> String {
    names.iter().map(|n| format!(", mrb_value {}", n)).collect()
}

/// Argument list `, a0, a1, ...`.
fn value_args(names: &[String]) -> String {
    names.iter().map(|n| format!(", {}", n)).collect()
}

fn positional(argc: usize) -> Vec<String> {
    (0..argc).map(|i| format!("a{}", i)).collect()
}

/// A function to emit, resolved from its declaration.
struct FunctionSig {
    c_name: String,
    params: Vec<String>,
    is_static: bool,
    body: HirId,
    role: FunctionRole,
    name: String,
    return_type: Lattice,
}

impl CGenerator<'_> {
    pub(super) fn emit_program(&mut self) -> CompileResult<()> {
        let main = self
            .session
            .main()
            .ok_or_else(|| CompileError::Codegen("no top-level program was typed".to_string()))?;

        self.emit_header();
        self.emit_globals();
        self.emit_prototypes()?;

        let methods: Vec<HirId> = self.session.methods().iter().map(|m| m.decl).collect();
        for decl in methods {
            self.emit_function(decl)?;
            self.stats.functions_compiled += 1;
        }
        for init in self.session.class_inits().to_vec() {
            self.emit_function(init)?;
            self.stats.class_initializers += 1;
        }
        for def in self.session.class_defs().to_vec() {
            self.emit_define_class(def)?;
        }
        if self.config.emit_method_glue {
            self.emit_glue()?;
        }
        self.emit_function(main)?;
        self.emit_multiplexers();
        self.emit_constructors();
        Ok(())
    }

    fn emit_header(&mut self) {
        let banner = format!(
            "/* {}: compiled by {} {} */",
            self.config.file_name,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );
        self.write_line(&banner);
        for include in INCLUDES {
            self.write_line(&format!("#include {}", include));
        }
        self.blank_line();
    }

    fn emit_globals(&mut self) {
        let session = self.session;
        let classes = session.classes();
        for class in classes {
            self.write_line(&format!("static struct RClass *{};", class_ptr(class)));
        }
        if !classes.is_empty() {
            self.blank_line();
        }
        if !self.config.emit_comments || session.global_decls().is_empty() {
            return;
        }
        for decl in session.global_decls() {
            if let HirKind::GlobalDecl { var } = session.hir.kind(*decl) {
                let vars = &session.vars;
                let what = match vars.kind(*var) {
                    VarKind::Constant => "constant",
                    _ => "global",
                };
                let text = format!("{} {}: {}", what, vars.name(*var), vars.lattice(*var));
                self.comment(&text);
            }
        }
        self.blank_line();
    }

    /// Resolve the C shape of a function declaration.
    fn function_sig(&self, decl: HirId) -> CompileResult<FunctionSig> {
        let HirKind::FunctionDecl {
            role,
            name,
            params,
            body,
            return_type,
        } = self.session.hir.kind(decl)
        else {
            return Err(CompileError::Codegen(format!(
                "node {:?} is not a function declaration",
                decl
            )));
        };
        let mut param_names = Vec::with_capacity(params.len());
        for param in params {
            match self.session.hir.kind(*param) {
                HirKind::ParamDecl { var } => {
                    param_names.push(local_name(self.session.vars.name(*var)))
                }
                other => {
                    return Err(CompileError::Codegen(format!(
                        "unexpected parameter node {:?}",
                        other
                    )))
                }
            }
        }
        let (c_name, is_static) = match role {
            FunctionRole::Method { owner, opening } => {
                (body_fn(owner, name, params.len(), *opening), true)
            }
            FunctionRole::ClassInit { class, serial } => (class_init_fn(class, *serial), true),
            FunctionRole::Main => (ENTRY_POINT.to_string(), false),
        };
        Ok(FunctionSig {
            c_name,
            params: param_names,
            is_static,
            body: *body,
            role: role.clone(),
            name: name.clone(),
            return_type: return_type.clone(),
        })
    }

    fn prototype(sig: &FunctionSig) -> String {
        format!(
            "{}mrb_value {}(mrb_state *mrb, mrb_value self{})",
            if sig.is_static { "static " } else { "" },
            sig.c_name,
            value_params(&sig.params)
        )
    }

    fn emit_prototypes(&mut self) -> CompileResult<()> {
        let session = self.session;
        let mut lines = Vec::new();
        for entry in session.methods() {
            let sig = self.function_sig(entry.decl)?;
            lines.push(format!("{};", Self::prototype(&sig)));
            if self.config.emit_method_glue {
                lines.push(format!(
                    "static mrb_value {}(mrb_state *mrb, mrb_value self);",
                    glue_fn(&sig.c_name)
                ));
            }
        }
        for init in session.class_inits() {
            let sig = self.function_sig(*init)?;
            lines.push(format!("{};", Self::prototype(&sig)));
        }
        for def in session.class_defs() {
            if let HirKind::DefClass { name, serial, .. } = session.hir.kind(*def) {
                lines.push(format!(
                    "static mrb_value {}(mrb_state *mrb);",
                    define_class_fn(name, *serial)
                ));
            }
        }
        for ((name, argc), _) in session.registry.entries() {
            lines.push(format!(
                "static mrb_value {}(mrb_state *mrb, mrb_value self{});",
                mux_fn(name, *argc),
                value_params(&positional(*argc))
            ));
        }
        for argc in session.registry.constructor_arities() {
            lines.push(format!(
                "static mrb_value {}(mrb_state *mrb, mrb_value klass{});",
                constructor_fn(argc),
                value_params(&positional(argc))
            ));
        }
        if lines.is_empty() {
            return Ok(());
        }
        for line in lines {
            self.write_line(&line);
        }
        self.blank_line();
        Ok(())
    }

    fn emit_function(&mut self, decl: HirId) -> CompileResult<()> {
        let sig = self.function_sig(decl)?;
        let header = match &sig.role {
            FunctionRole::Method {
                owner: Some(class),
                opening: Some(serial),
            } if *serial > 0 => format!(
                "{}#{}/{} from opening {} returns {}",
                class,
                sig.name,
                sig.params.len(),
                serial,
                sig.return_type
            ),
            FunctionRole::Method {
                owner: Some(class), ..
            } => {
                format!("{}#{}/{} returns {}", class, sig.name, sig.params.len(), sig.return_type)
            }
            FunctionRole::Method { owner: None, .. } => {
                format!("{}/{} returns {}", sig.name, sig.params.len(), sig.return_type)
            }
            FunctionRole::ClassInit { class, serial } => {
                format!("body of class {} (opening {})", class, serial)
            }
            FunctionRole::Main => "top-level program".to_string(),
        };
        self.comment(&header);
        self.write_line(&Self::prototype(&sig));
        self.write_line("{");
        self.indent();
        if sig.role == FunctionRole::Main && self.config.emit_method_glue {
            let top: Vec<(String, usize)> = self
                .session
                .top_level_methods()
                .map(|m| (m.name.clone(), m.arity))
                .collect();
            for (name, arity) in top {
                let function = method_fn(&None, &name, arity);
                self.emit_define_method("mrb->object_class", &name, &function, arity);
            }
        }
        self.emit_stmt(sig.body)?;
        self.dedent();
        self.write_line("}");
        self.blank_line();
        Ok(())
    }

    fn emit_define_method(&mut self, target: &str, name: &str, function: &str, arity: usize) {
        self.write_line(&format!(
            "mrb_define_method(mrb, {}, {}, {}, MRB_ARGS_REQ({}));",
            target,
            c_string(name),
            glue_fn(function),
            arity
        ));
    }

    /// Creates (or reopens) the class, registers the methods its body
    /// defines and runs the body.
    fn emit_define_class(&mut self, def: HirId) -> CompileResult<()> {
        let session = self.session;
        let HirKind::DefClass {
            name,
            serial,
            methods,
            ..
        } = session.hir.kind(def)
        else {
            return Err(CompileError::Codegen(format!(
                "node {:?} is not a class definition",
                def
            )));
        };
        let ptr = class_ptr(name);
        self.write_line(&format!(
            "static mrb_value {}(mrb_state *mrb)",
            define_class_fn(name, *serial)
        ));
        self.write_line("{");
        self.indent();
        self.write_line(&format!(
            "{} = mrb_define_class(mrb, {}, mrb->object_class);",
            ptr,
            c_string(name)
        ));
        if self.config.emit_method_glue {
            let owner = Some(name.clone());
            for (method, arity) in methods {
                let function = body_fn(&owner, method, *arity, Some(*serial));
                self.emit_define_method(&ptr, method, &function, *arity);
            }
        }
        self.write_line(&format!(
            "{}(mrb, mrb_obj_value({}));",
            class_init_fn(name, *serial),
            ptr
        ));
        self.write_line(&format!("return mrb_obj_value({});", ptr));
        self.dedent();
        self.write_line("}");
        self.blank_line();
        Ok(())
    }

    /// Thunks with the runtime's method signature for each compiled method.
    fn emit_glue(&mut self) -> CompileResult<()> {
        let session = self.session;
        for entry in session.methods() {
            let c_name = body_fn(&entry.owner, &entry.name, entry.arity, entry.opening);
            let args = positional(entry.arity);
            self.write_line(&format!(
                "static mrb_value {}(mrb_state *mrb, mrb_value self)",
                glue_fn(&c_name)
            ));
            self.write_line("{");
            self.indent();
            if !args.is_empty() {
                self.write_line(&format!("mrb_value {};", args.join(", ")));
                let refs: String = args.iter().map(|a| format!(", &{}", a)).collect();
                self.write_line(&format!(
                    "mrb_get_args(mrb, \"{}\"{});",
                    "o".repeat(args.len()),
                    refs
                ));
            }
            self.write_line(&format!("return {}(mrb, self{});", c_name, value_args(&args)));
            self.dedent();
            self.write_line("}");
            self.blank_line();
        }
        Ok(())
    }

    /// One multiplexer per registry key. A lone top-level definition is
    /// called directly. Otherwise owners with a fixed body are tested most
    /// recent first and every other receiver goes back to the runtime, which
    /// also reaches top-level definitions and bodies of reopened classes
    /// through their registered glue.
    fn emit_multiplexers(&mut self) {
        let session = self.session;
        for ((name, argc), owners) in session.registry.entries() {
            let args = positional(*argc);
            let classes: Vec<&str> = owners.iter().filter_map(|o| o.as_deref()).collect();
            let checks: Vec<(&str, String)> = classes
                .iter()
                .filter_map(|class| {
                    let entry = session.fixed_body(class, name, *argc)?;
                    Some((*class, body_fn(&entry.owner, name, *argc, entry.opening)))
                })
                .collect();
            let top_level_only = matches!(owners, [None]);

            if classes.is_empty() {
                self.comment(&format!("dispatch {}/{}", name, argc));
            } else {
                self.comment(&format!("dispatch {}/{} over {}", name, argc, classes.join(", ")));
            }
            self.write_line(&format!(
                "static mrb_value {}(mrb_state *mrb, mrb_value self{})",
                mux_fn(name, *argc),
                value_params(&args)
            ));
            self.write_line("{");
            self.indent();
            if !checks.is_empty() {
                self.write_line("struct RClass *klass = mrb_obj_class(mrb, self);");
                for (class, function) in &checks {
                    self.write_line(&format!(
                        "if (klass == {}) return {}(mrb, self{});",
                        class_ptr(class),
                        function,
                        value_args(&args)
                    ));
                }
            }
            if top_level_only {
                self.write_line(&format!(
                    "return {}(mrb, self{});",
                    method_fn(&None, name, *argc),
                    value_args(&args)
                ));
            } else {
                self.write_line(&format!(
                    "return mrb_funcall(mrb, self, {}, {}{});",
                    c_string(name),
                    argc,
                    value_args(&args)
                ));
            }
            self.dedent();
            self.write_line("}");
            self.blank_line();
            self.stats.multiplexers += 1;
        }
    }

    /// One constructor per `.new` arity: allocate, then run `initialize`.
    fn emit_constructors(&mut self) {
        let session = self.session;
        for argc in session.registry.constructor_arities() {
            let args = positional(argc);
            let checks: Vec<(&str, String)> = session
                .registry
                .owners("initialize", argc)
                .iter()
                .filter_map(|o| {
                    let class = o.as_deref()?;
                    let entry = session.fixed_body(class, "initialize", argc)?;
                    Some((class, body_fn(&entry.owner, "initialize", argc, entry.opening)))
                })
                .collect();

            self.comment(&format!("allocate and initialize with {} argument(s)", argc));
            self.write_line(&format!(
                "static mrb_value {}(mrb_state *mrb, mrb_value klass{})",
                constructor_fn(argc),
                value_params(&args)
            ));
            self.write_line("{");
            self.indent();
            self.write_line("struct RClass *c = mrb_class_ptr(klass);");
            self.write_line("mrb_value obj = mrb_obj_value(mrb_obj_alloc(mrb, MRB_INSTANCE_TT(c), c));");
            for (class, function) in checks {
                self.write_line(&format!("if (c == {}) {{", class_ptr(class)));
                self.indent();
                self.write_line(&format!("{}(mrb, obj{});", function, value_args(&args)));
                self.write_line("return obj;");
                self.dedent();
                self.write_line("}");
            }
            self.write_line(&format!(
                "mrb_funcall(mrb, obj, \"initialize\", {}{});",
                argc,
                value_args(&args)
            ));
            self.write_line("return obj;");
            self.dedent();
            self.write_line("}");
            self.blank_line();
            self.stats.constructors += 1;
        }
    }
}
