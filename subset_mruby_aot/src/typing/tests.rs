use pretty_assertions::assert_eq;
use subset_mruby_ast::read;

use super::*;
use crate::hir::{Callee, HirNode, Literal, PrimOp};
use crate::lattice::{BuiltinClass, ClassRef};

fn typed_with(source: &str, options: &CompileOptions) -> Session {
    let root = read(source).expect("test program should read");
    let mut session = Session::new();
    type_program(&mut session, options, &root).expect("test program should type");
    session
}

fn typed(source: &str) -> Session {
    typed_with(source, &CompileOptions::new())
}

fn type_error(source: &str) -> CompileError {
    let root = read(source).expect("test program should read");
    let mut session = Session::new();
    type_program(&mut session, &CompileOptions::new(), &root)
        .expect_err("test program should be rejected")
}

fn find<'a>(session: &'a Session, pred: impl Fn(&HirNode) -> bool) -> Vec<&'a HirNode> {
    session.hir.iter().map(|(_, n)| n).filter(|n| pred(n)).collect()
}

fn return_type(session: &Session, owner: Option<&str>, name: &str, arity: usize) -> Lattice {
    let owner = owner.map(str::to_string);
    let entry = session
        .method(&owner, name, arity)
        .expect("method should be compiled");
    match session.hir.kind(entry.decl) {
        HirKind::FunctionDecl { return_type, .. } => return_type.clone(),
        other => panic!("expected a function, got {:?}", other),
    }
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
fn test_branch_merge_builds_class_set() {
    let session = typed(TWO_CLASSES);
    let ifs = find(&session, |n| matches!(n.kind, HirKind::IfElse { .. }));
    assert_eq!(ifs.len(), 1);
    assert_eq!(
        ifs[0].lattice,
        Lattice::set_of([ClassRef::user("A"), ClassRef::user("B")])
    );
    assert_eq!(
        session.registry.owners("foo", 0),
        &[Some("B".to_string()), Some("A".to_string())]
    );
    assert_eq!(session.registry.constructor_arities().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn test_method_return_types() {
    let session = typed(TWO_CLASSES);
    assert_eq!(return_type(&session, Some("A"), "foo", 0), Lattice::int(1));
    assert_eq!(return_type(&session, Some("B"), "foo", 0), Lattice::string("b"));
    assert_eq!(session.classes(), &["A".to_string(), "B".to_string()]);
    assert_eq!(session.class_defs().len(), 2);
}

#[test]
fn test_constructor_call_is_typed_instance() {
    let session = typed(TWO_CLASSES);
    let constructs = find(&session, |n| {
        matches!(
            n.kind,
            HirKind::Call {
                callee: Callee::Construct,
                ..
            }
        )
    });
    assert_eq!(constructs.len(), 2);
    assert_eq!(constructs[0].lattice, Lattice::set_of([ClassRef::user("A")]));
}

#[test]
fn test_unknown_params_dispatch() {
    let session = typed(
        r#"(scope [] (def add [a b] (scope [] (call (lvar a) + [(lvar b)]))))"#,
    );
    assert_eq!(return_type(&session, None, "add", 2), Lattice::Dynamic);
    assert!(session.registry.entries().any(|(k, _)| k == &("+".to_string(), 1)));
}

#[test]
fn test_fast_path_on_known_integers() {
    let session = typed(
        r#"(scope [x] (begin
             (asgn (lvar x) (int "1" 10))
             (asgn (lvar x) (call (lvar x) + [(int "2" 10)]))))"#,
    );
    let adds = find(&session, |n| {
        matches!(
            n.kind,
            HirKind::Call {
                callee: Callee::Prim(PrimOp::NumAdd),
                ..
            }
        )
    });
    assert_eq!(adds.len(), 1);
    assert_eq!(
        adds[0].lattice,
        Lattice::set_of([BuiltinClass::Integer, BuiltinClass::Float])
    );
    assert!(session.registry.is_empty());
}

#[test]
fn test_dispatch_widens_ivars() {
    let session = typed(
        r#"(scope [] (class A nil (scope [] (begin
             (def get [] (scope [] (begin
               (asgn (ivar @x) (int "1" 10))
               (fcall puts [(str "x")])
               (ivar @x))))
             (def peek [] (scope [] (begin
               (asgn (ivar @x) (int "1" 10))
               (ivar @x))))))))"#,
    );
    assert_eq!(return_type(&session, Some("A"), "get", 0), Lattice::Dynamic);
    assert_eq!(return_type(&session, Some("A"), "peek", 0), Lattice::int(1));
}

fn prim_calls(session: &Session, op: PrimOp) -> usize {
    find(session, |n| {
        matches!(&n.kind, HirKind::Call { callee: Callee::Prim(p), .. } if *p == op)
    })
    .len()
}

fn dispatched(session: &Session, name: &str) -> usize {
    find(session, |n| {
        matches!(&n.kind, HirKind::Call { callee: Callee::Dispatch(d), .. } if d == name)
    })
    .len()
}

#[test]
fn test_ivar_assigned_in_one_arm_is_dynamic() {
    let session = typed(
        r#"(scope [] (class A nil (scope [] (def m [c] (scope [] (begin
             (if (lvar c) (asgn (ivar @x) (int "1" 10)))
             (call (ivar @x) + [(int "1" 10)])))))))"#,
    );
    assert_eq!(prim_calls(&session, PrimOp::NumAdd), 0);
    assert_eq!(dispatched(&session, "+"), 1);
    assert_eq!(return_type(&session, Some("A"), "m", 1), Lattice::Dynamic);
}

#[test]
fn test_ivar_from_then_arm_not_seen_by_else_arm() {
    let session = typed(
        r#"(scope [] (class A nil (scope [] (def m [c] (scope []
             (if (lvar c)
               (asgn (ivar @x) (int "1" 10))
               (call (ivar @x) + [(int "1" 10)])))))))"#,
    );
    assert_eq!(prim_calls(&session, PrimOp::NumAdd), 0);
    assert_eq!(dispatched(&session, "+"), 1);
}

#[test]
fn test_ivar_assigned_in_loop_is_dynamic() {
    let session = typed(
        r#"(scope [] (class A nil (scope [] (def m [c] (scope [] (begin
             (while (lvar c) (begin (asgn (ivar @x) (int "1" 10)) (break)))
             (call (ivar @x) + [(int "1" 10)])))))))"#,
    );
    assert_eq!(prim_calls(&session, PrimOp::NumAdd), 0);
    assert_eq!(dispatched(&session, "+"), 1);
    assert!(session.warnings.is_empty());
}

#[test]
fn test_ivar_known_before_branch_keeps_join() {
    let session = typed(
        r#"(scope [] (class A nil (scope [] (def m [c] (scope [] (begin
             (asgn (ivar @x) (int "1" 10))
             (if (lvar c) (asgn (ivar @x) (int "2" 10)))
             (call (ivar @x) + [(int "1" 10)])))))))"#,
    );
    assert_eq!(prim_calls(&session, PrimOp::NumAdd), 1);
    assert_eq!(dispatched(&session, "+"), 0);
}

#[test]
fn test_setter_value_is_assigned_value() {
    let session = typed(
        r#"(scope [o y] (begin
             (asgn (lvar o) (array))
             (asgn (lvar y) (asgn (call (lvar o) x []) (int "5" 10)))))"#,
    );
    let assigns = find(&session, |n| match n.kind {
        HirKind::Assign { target, .. } => session.vars.name(target) == "y",
        _ => false,
    });
    assert_eq!(assigns.len(), 1);
    assert_eq!(assigns[0].lattice, Lattice::int(5));
    let HirKind::Assign { value, .. } = &assigns[0].kind else {
        unreachable!()
    };
    let HirKind::Block(parts) = session.hir.kind(*value) else {
        panic!("expected a block, got {:?}", session.hir.kind(*value))
    };
    assert!(matches!(
        session.hir.kind(parts[1]),
        HirKind::Call { callee: Callee::Dispatch(name), .. } if name == "x="
    ));
    match session.hir.kind(parts[2]) {
        HirKind::Var(var) => assert!(session.vars.name(*var).starts_with("asgn#")),
        other => panic!("expected the stored value, got {:?}", other),
    }
}

#[test]
fn test_times_becomes_counted_loop() {
    let session = typed(
        r#"(scope [s] (begin
             (asgn (lvar s) (int "0" 10))
             (call (int "5" 10) times []
               (block [i] (asgn (lvar s) (call (lvar s) + [(lvar i)]))))))"#,
    );
    let loops = find(&session, |n| matches!(n.kind, HirKind::CountedLoop { .. }));
    assert_eq!(loops.len(), 1);
    let HirKind::CountedLoop { low, high, var, .. } = &loops[0].kind else {
        unreachable!()
    };
    assert!(matches!(
        session.hir.kind(*low),
        HirKind::Literal(Literal::Int { value: 0, .. })
    ));
    assert!(matches!(
        session.hir.kind(*high),
        HirKind::Literal(Literal::Int { value: 5, .. })
    ));
    assert_eq!(session.vars.name(*var), "i");
    assert!(session.stats.loop_iterations >= 2);
    assert!(session.warnings.is_empty());
}

#[test]
fn test_times_requires_integer_receiver() {
    let err = type_error(
        r#"(scope [] (def f [n] (scope [] (call (lvar n) times [] (block [] (nil))))))"#,
    );
    assert!(matches!(err, CompileError::Unsupported { .. }), "{}", err);
}

#[test]
fn test_loop_widening_after_limit() {
    let options = CompileOptions {
        max_loop_iterations: 1,
        ..CompileOptions::new()
    };
    let session = typed_with(
        r#"(scope [x] (begin
             (asgn (lvar x) (int "0" 10))
             (while #3 (true) (asgn (lvar x) (call (lvar x) + [(int "1" 10)])))))"#,
        &options,
    );
    assert_eq!(session.stats.widened_variables, 1);
    assert_eq!(session.warnings.len(), 1);
    assert!(session.warnings[0].starts_with("line 3:"));
}

#[test]
fn test_loop_converges_without_widening() {
    let session = typed(
        r#"(scope [x] (begin
             (asgn (lvar x) (int "0" 10))
             (while (call (lvar x) < [(int "10" 10)])
               (asgn (lvar x) (call (lvar x) + [(int "1" 10)])))))"#,
    );
    assert_eq!(session.stats.widened_variables, 0);
    assert!(session.warnings.is_empty());
}

#[test]
fn test_missing_else_returns_nil() {
    let session = typed(r#"(scope [] (def f [c] (scope [] (if (lvar c) (int "1" 10)))))"#);
    assert_eq!(
        return_type(&session, None, "f", 1),
        Lattice::set_of([BuiltinClass::Integer, BuiltinClass::NilClass])
    );
}

#[test]
fn test_assignment_tail_returns_value() {
    let session = typed(r#"(scope [] (def f [] (scope [y] (asgn (lvar y) (str "v")))))"#);
    assert_eq!(return_type(&session, None, "f", 0), Lattice::string("v"));
}

#[test]
fn test_short_circuit_uses_temp() {
    let session = typed(
        r#"(scope [] (and (call (int "1" 10) + [(int "2" 10)]) (str "b")))"#,
    );
    let selects = find(&session, |n| matches!(n.kind, HirKind::CondOp { .. }));
    assert_eq!(selects.len(), 1);
    let temps = find(&session, |n| match n.kind {
        HirKind::LocalDecl { var, .. } => session.vars.name(var).starts_with("cond#"),
        _ => false,
    });
    assert_eq!(temps.len(), 1);
}

#[test]
fn test_overflowing_literal_is_float() {
    let session = typed(r#"(scope [] (int "99999999999999999999" 10))"#);
    let floats = find(&session, |n| {
        matches!(n.kind, HirKind::Literal(Literal::Float { .. }))
    });
    assert_eq!(floats.len(), 1);
}

#[test]
fn test_constant_reassignment_rejected() {
    let err = type_error(
        r#"(scope [] (begin (asgn (const X) (int "1" 10)) (asgn (const X) (str "a"))))"#,
    );
    assert!(matches!(err, CompileError::Unsupported { .. }));
    typed(r#"(scope [] (begin (asgn (const X) (int "1" 10)) (asgn (const X) (int "1" 10))))"#);
}

#[test]
fn test_unsupported_constructs() {
    let cases = [
        r#"(scope [] (yield))"#,
        r#"(scope [] (module M (scope [] (nil))))"#,
        r#"(scope [] (break))"#,
        r#"(scope [] (def f [] (scope [] (def g [] (scope [] (nil))))))"#,
        r#"(scope [] (class A (const Object) (scope [] (nil))))"#,
        r#"(scope [] (fcall each [] (block [] (nil))))"#,
    ];
    for case in cases {
        let err = type_error(case);
        assert!(err.is_fatal(), "{}: {}", case, err);
        assert!(matches!(err, CompileError::Unsupported { .. }), "{}: {}", case, err);
    }
}

#[test]
fn test_undefined_local() {
    let err = type_error(r#"(scope [] (lvar #4 y))"#);
    match err {
        CompileError::UndefinedLocal { name, line } => {
            assert_eq!(name, "y");
            assert_eq!(line, 4);
        }
        other => panic!("expected an undefined local, got {}", other),
    }
}

#[test]
fn test_top_level_self_is_main() {
    let session = typed(r#"(scope [] (fcall puts [(self)]))"#);
    let selves = find(&session, |n| matches!(n.kind, HirKind::SelfRef));
    assert!(selves
        .iter()
        .all(|n| n.lattice == Lattice::Constant(ConstValue::Main)));
    assert!(session.main().is_some());
}
