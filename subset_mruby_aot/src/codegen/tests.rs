use pretty_assertions::assert_eq;
use subset_mruby_ast::read;

use super::*;
use crate::typing::type_program;

fn generate_with(source: &str, options: &CompileOptions) -> (String, CompileStats) {
    let root = read(source).expect("test program should read");
    let mut session = Session::new();
    type_program(&mut session, options, &root).expect("test program should type");
    CGenerator::new(CodegenConfig::from_options(options), &session)
        .generate()
        .expect("test program should generate")
}

fn generate(source: &str) -> String {
    generate_with(source, &CompileOptions::new()).0
}

/// Trimmed lines of the C function whose definition starts with `header`.
/// Prototypes are skipped.
fn function_body<'a>(code: &'a str, header: &str) -> Vec<&'a str> {
    let mut lines = code
        .lines()
        .skip_while(|l| !(l.starts_with(header) && !l.ends_with(';')));
    let mut body = Vec::new();
    for line in lines.by_ref() {
        body.push(line.trim());
        if line == "}" {
            break;
        }
    }
    body
}

const TWO_CLASSES: &str = r#"
(scope #1 [x]
  (begin
    (class #1 A nil (scope [] (def #2 foo [] (scope [] (int "1" 10)))))
    (class #4 B nil (scope [] (def #5 foo [] (scope [] (str "b")))))
    (if #7 (true)
      (asgn (lvar x) (call (const A) new []))
      (asgn (lvar x) (call (const B) new [])))
    (call #10 (lvar x) foo [])))
"#;

#[test]
fn test_multiplexer_checks_most_recent_owner_first() {
    let code = generate(TWO_CLASSES);
    let mux = function_body(&code, "static mrb_value mux_foo_0(");
    assert_eq!(
        mux,
        vec![
            "static mrb_value mux_foo_0(mrb_state *mrb, mrb_value self)",
            "{",
            "struct RClass *klass = mrb_obj_class(mrb, self);",
            "if (klass == class_B) return m_B_foo_0(mrb, self);",
            "if (klass == class_A) return m_A_foo_0(mrb, self);",
            "return mrb_funcall(mrb, self, \"foo\", 0);",
            "}",
        ]
    );
}

#[test]
fn test_constructor_allocates_before_initialize() {
    let code = generate(
        r#"(scope [] (begin
             (class A nil (scope [] (def initialize [v] (scope [] (asgn (ivar @v) (lvar v))))))
             (call (const A) new [(int "3" 10)])))"#,
    );
    let ctor = function_body(&code, "static mrb_value new_1(");
    let alloc = ctor
        .iter()
        .position(|l| l.contains("mrb_obj_alloc"))
        .expect("constructor should allocate");
    let init = ctor
        .iter()
        .position(|l| l.starts_with("m_A_initialize_1(mrb, obj, a0);"))
        .expect("constructor should call the compiled initialize");
    assert!(alloc < init);
    assert!(ctor.contains(&"mrb_funcall(mrb, obj, \"initialize\", 1, a0);"));
    assert!(code.contains("new_1(mrb, mrb_const_get("));
}

#[test]
fn test_lone_top_level_owner_is_called_directly() {
    let code = generate(
        r#"(scope [] (begin
             (def fib [n] (scope [] (lvar n)))
             (fcall fib [(int "10" 10)])))"#,
    );
    let mux = function_body(&code, "static mrb_value mux_fib_1(");
    assert!(mux.contains(&"return f_fib_1(mrb, self, a0);"));
    assert!(!mux.iter().any(|l| l.contains("mrb_funcall")));
    assert!(code.contains("mrb_define_method(mrb, mrb->object_class, \"fib\", glue_f_fib_1, MRB_ARGS_REQ(1));"));
}

#[test]
fn test_mixed_chain_falls_back_to_runtime() {
    let code = generate(
        r#"(scope [] (begin
             (def foo [] (scope [] (nil)))
             (class A nil (scope [] (def foo [] (scope [] (int "1" 10)))))
             (fcall foo [])))"#,
    );
    let mux = function_body(&code, "static mrb_value mux_foo_0(");
    assert!(mux.contains(&"if (klass == class_A) return m_A_foo_0(mrb, self);"));
    assert_eq!(mux[mux.len() - 2], "return mrb_funcall(mrb, self, \"foo\", 0);");
    assert!(!mux.iter().any(|l| l.contains("f_foo_0")));
}

#[test]
fn test_fast_path_calls_runtime_primitive() {
    let (code, stats) = generate_with(
        r#"(scope [x] (begin
             (asgn (lvar x) (int "1" 10))
             (asgn (lvar x) (call (lvar x) + [(int "2" 10)]))))"#,
        &CompileOptions::new(),
    );
    assert!(code.contains("v_x = num_add(mrb, v_x, mrb_fixnum_value(2));"));
    assert_eq!(stats.fast_path_calls, 1);
    assert_eq!(stats.dispatched_calls, 0);
}

#[test]
fn test_times_lowers_to_for_loop() {
    let (code, stats) = generate_with(
        r#"(scope [s] (begin
             (asgn (lvar s) (int "0" 10))
             (call (int "5" 10) times []
               (block [i] (asgn (lvar s) (call (lvar s) + [(lvar i)]))))))"#,
        &CompileOptions::new(),
    );
    assert!(code.contains("mrb_value v_i = mrb_nil_value();"));
    assert!(code.contains(
        "for (mrb_int _k0 = mrb_fixnum(mrb_fixnum_value(0)), _n0 = mrb_fixnum(mrb_fixnum_value(5)); _k0 < _n0; _k0++) {"
    ));
    assert!(code.contains("v_i = mrb_fixnum_value(_k0);"));
    assert_eq!(stats.counted_loops, 1);
}

#[test]
fn test_variable_kinds_use_runtime_storage() {
    let code = generate(
        r#"(scope [] (begin
             (asgn (gvar $g) (int "1" 10))
             (asgn (const K) (str "k"))
             (class A nil (scope [] (begin
               (asgn (cvar @@n) (int "0" 10))
               (def bump [] (scope [] (asgn (ivar @v) (cvar @@n)))))))))"#,
    );
    assert!(code.contains("mrb_gv_set(mrb, mrb_intern_lit(mrb, \"$g\"), mrb_fixnum_value(1));"));
    assert!(code.contains(
        "mrb_const_set(mrb, mrb_obj_value(mrb->object_class), mrb_intern_lit(mrb, \"K\"), mrb_str_new(mrb, \"k\", 1));"
    ));
    assert!(code.contains("mrb_cv_set(mrb, mrb_obj_value(class_A), mrb_intern_lit(mrb, \"@@n\"), mrb_fixnum_value(0));"));
    assert!(code.contains(
        "mrb_iv_set(mrb, self, mrb_intern_lit(mrb, \"@v\"), mrb_cv_get(mrb, mrb_obj_value(class_A), mrb_intern_lit(mrb, \"@@n\")));"
    ));
    assert!(code.contains("return mrb_iv_get(mrb, self, mrb_intern_lit(mrb, \"@v\"));"));
}

#[test]
fn test_section_order() {
    let code = generate(TWO_CLASSES);
    let pos = |needle: &str| {
        code.find(needle)
            .unwrap_or_else(|| panic!("missing {:?}", needle))
    };
    assert!(code.starts_with("/* -: compiled by subset_mruby_aot "));
    assert!(pos("#include <mruby.h>") < pos("static struct RClass *class_A;"));
    assert!(pos("static struct RClass *class_B;") < pos("static mrb_value m_A_foo_0(mrb_state *mrb, mrb_value self);"));
    assert!(pos("static mrb_value m_A_foo_0(mrb_state *mrb, mrb_value self)\n{") < pos("static mrb_value init_class_A_0(mrb_state *mrb, mrb_value self)\n{"));
    assert!(pos("static mrb_value define_class_A_0(mrb_state *mrb)\n{") < pos("mrb_value compiled_main(mrb_state *mrb, mrb_value self)\n{"));
    assert!(pos("mrb_value compiled_main(mrb_state *mrb, mrb_value self)\n{") < pos("static mrb_value mux_foo_0(mrb_state *mrb, mrb_value self)\n{"));
    assert!(pos("static mrb_value mux_foo_0(mrb_state *mrb, mrb_value self)\n{") < pos("static mrb_value new_0(mrb_state *mrb, mrb_value klass)\n{"));
}

#[test]
fn test_release_options_drop_comments_and_glue() {
    let options = CompileOptions {
        emit_method_glue: false,
        ..CompileOptions::release()
    };
    let (code, stats) = generate_with(TWO_CLASSES, &options);
    assert!(!code.lines().skip(1).any(|l| l.trim_start().starts_with("/*")));
    assert!(!code.contains("glue_"));
    assert!(!code.contains("mrb_define_method"));
    assert_eq!(stats.functions_compiled, 2);
    assert_eq!(stats.class_initializers, 2);
    assert_eq!(stats.multiplexers, 1);
    assert_eq!(stats.constructors, 1);
}

#[test]
fn test_short_circuit_selects_value() {
    let code = generate(r#"(scope [] (fcall puts [(or (nil) (str "d"))]))"#);
    assert!(code.contains(
        "mux_puts_1(mrb, self, (mrb_test(mrb_nil_value()) ? mrb_nil_value() : mrb_str_new(mrb, \"d\", 1)));"
    ));
}

#[test]
fn test_glue_unpacks_arguments() {
    let code = generate(r#"(scope [] (def add [a b] (scope [] (lvar a))))"#);
    let glue = function_body(&code, "static mrb_value glue_f_add_2(");
    assert_eq!(
        glue[2..5].to_vec(),
        vec![
            "mrb_value a0, a1;",
            "mrb_get_args(mrb, \"oo\", &a0, &a1);",
            "return f_add_2(mrb, self, a0, a1);",
        ]
    );
}

#[test]
fn test_reopened_class_keeps_each_body() {
    let code = generate(
        r#"(scope [a] (begin
             (class A nil (scope [] (def foo [] (scope [] (int "1" 10)))))
             (asgn (lvar a) (call (const A) new []))
             (fcall puts [(call (lvar a) foo [])])
             (class A nil (scope [] (def foo [] (scope [] (int "2" 10)))))
             (fcall puts [(call (lvar a) foo [])])))"#,
    );
    let first = function_body(&code, "static mrb_value m_A_foo_0(");
    let second = function_body(&code, "static mrb_value m_A_foo_0_r1(");
    assert!(first.contains(&"return mrb_fixnum_value(1);"));
    assert!(second.contains(&"return mrb_fixnum_value(2);"));

    let define_first = function_body(&code, "static mrb_value define_class_A_0(");
    let define_second = function_body(&code, "static mrb_value define_class_A_1(");
    assert!(define_first.contains(&"mrb_define_method(mrb, class_A, \"foo\", glue_m_A_foo_0, MRB_ARGS_REQ(0));"));
    assert!(define_second.contains(&"mrb_define_method(mrb, class_A, \"foo\", glue_m_A_foo_0_r1, MRB_ARGS_REQ(0));"));

    let mux = function_body(&code, "static mrb_value mux_foo_0(");
    assert!(!mux.iter().any(|l| l.contains("klass == class_A")));
    assert_eq!(mux[mux.len() - 2], "return mrb_funcall(mrb, self, \"foo\", 0);");
}

#[test]
fn test_setter_yields_assigned_value() {
    let code = generate(
        r#"(scope [o y] (begin
             (asgn (lvar o) (array))
             (asgn (lvar y) (asgn (call (lvar o) x []) (int "5" 10)))))"#,
    );
    assert!(code.contains(
        "v_y = ((t_asgn_230 = mrb_fixnum_value(5)), mux_x_3D_1(mrb, v_o, t_asgn_230), t_asgn_230);"
    ));
    assert!(!code.contains("v_y = mux_x_3D_1("));
}

#[test]
fn test_times_as_value_yields_receiver() {
    let (code, stats) = generate_with(
        r#"(scope [x] (asgn (lvar x) (call (int "3" 10) times [] (block [] (nil)))))"#,
        &CompileOptions::new(),
    );
    let main = function_body(&code, "mrb_value compiled_main(");
    let pos = |needle: &str| {
        main.iter()
            .position(|l| l.starts_with(needle))
            .unwrap_or_else(|| panic!("missing {:?}", needle))
    };
    assert!(pos("mrb_value _v0 = mrb_nil_value();") < pos("for (mrb_int _k0"));
    assert!(pos("for (mrb_int _k0") < pos("_v0 = mrb_fixnum_value(3);"));
    assert!(pos("_v0 = mrb_fixnum_value(3);") < pos("v_x = _v0;"));
    assert_eq!(stats.counted_loops, 1);
}

#[test]
fn test_loop_inside_conditional_value_stays_conditional() {
    let code = generate(
        r#"(scope [] (def m [c] (scope [y] (asgn (lvar y)
             (if (lvar c) (call (int "2" 10) times [] (block [] (nil))))))))"#,
    );
    let body = function_body(&code, "static mrb_value f_m_1(");
    let pos = |needle: &str| {
        body.iter()
            .position(|l| l.starts_with(needle))
            .unwrap_or_else(|| panic!("missing {:?}", needle))
    };
    assert!(pos("mrb_value _v0 = mrb_nil_value();") < pos("if (mrb_test(v_c)) {"));
    assert!(pos("if (mrb_test(v_c)) {") < pos("for (mrb_int _k0"));
    assert!(pos("for (mrb_int _k0") < pos("_v0 = mrb_fixnum_value(2);"));
    assert!(pos("_v0 = mrb_fixnum_value(2);") < pos("v_y = _v0;"));
    assert!(body.contains(&"return v_y;"));
}

#[test]
fn test_times_in_tail_returns_receiver() {
    let code = generate(
        r#"(scope [] (def m [] (scope [n] (begin
             (asgn (lvar n) (int "4" 10))
             (call (lvar n) times [] (block [] (nil)))))))"#,
    );
    let body = function_body(&code, "static mrb_value f_m_0(");
    assert!(body.contains(&"_v0 = v_n;"));
    assert!(body
        .iter()
        .any(|l| l.starts_with("for (mrb_int _k0 = mrb_fixnum(mrb_fixnum_value(0)), _n0 = mrb_fixnum(_v0);")));
    assert!(body.contains(&"return _v0;"));
}
