use super::*;

fn samples() -> Vec<Lattice> {
    vec![
        Lattice::Unknown,
        Lattice::Dynamic,
        Lattice::int(1),
        Lattice::int(2),
        Lattice::float(1.5),
        Lattice::float(f64::NAN),
        Lattice::string("a"),
        Lattice::nil(),
        Lattice::class_object(ClassRef::user("A")),
        Lattice::set_of([BuiltinClass::Integer]),
        Lattice::set_of([BuiltinClass::Integer, BuiltinClass::Float]),
        Lattice::set_of([ClassRef::user("A")]),
        Lattice::set_of([ClassRef::user("B"), ClassRef::user("A")]),
    ]
}

#[test]
fn test_join_identities() {
    for x in samples() {
        assert_eq!(x.join(&x), x, "join({x}, {x}) must be {x}");
        assert_eq!(Lattice::Unknown.join(&x), x);
        assert_eq!(x.join(&Lattice::Unknown), x);
        assert_eq!(Lattice::Dynamic.join(&x), Lattice::Dynamic);
        assert_eq!(x.join(&Lattice::Dynamic), Lattice::Dynamic);
    }
}

#[test]
fn test_join_commutative_and_associative() {
    let all = samples();
    for a in &all {
        for b in &all {
            assert_eq!(a.join(b), b.join(a), "{a} ⊔ {b} is not commutative");
            for c in &all {
                assert_eq!(
                    a.join(b).join(c),
                    a.join(&b.join(c)),
                    "({a} ⊔ {b}) ⊔ {c} differs from {a} ⊔ ({b} ⊔ {c})"
                );
            }
        }
    }
}

#[test]
fn test_join_constants() {
    assert_eq!(
        Lattice::int(1).join(&Lattice::int(2)),
        Lattice::set_of([BuiltinClass::Integer])
    );
    assert_eq!(
        Lattice::int(1).join(&Lattice::string("x")),
        Lattice::set_of([BuiltinClass::String, BuiltinClass::Integer])
    );
    assert_eq!(
        Lattice::set_of([ClassRef::user("A")]).join(&Lattice::set_of([ClassRef::user("B")])),
        Lattice::set_of([ClassRef::user("A"), ClassRef::user("B")])
    );
}

#[test]
fn test_join_does_not_mutate_inputs() {
    let shared = Lattice::set_of([BuiltinClass::Integer]);
    let alias = shared.clone();
    let joined = shared.join(&Lattice::string("s"));
    assert_eq!(shared, alias);
    assert_eq!(joined.to_string(), "{Integer, String}");
}

#[test]
fn test_join_in_place() {
    let mut x = Lattice::int(1);
    assert!(!x.join_in_place(&Lattice::int(1)));
    assert!(x.join_in_place(&Lattice::float(2.0)));
    assert_eq!(x, Lattice::set_of([BuiltinClass::Integer, BuiltinClass::Float]));
}

#[test]
fn test_includes() {
    let a = ConstValue::Class(ClassRef::user("A"));
    assert!(!Lattice::Unknown.includes(&ConstValue::Nil));
    assert!(Lattice::Dynamic.includes(&ConstValue::Int(3)));
    assert!(Lattice::int(3).includes(&ConstValue::Int(3)));
    assert!(!Lattice::int(3).includes(&ConstValue::Int(4)));
    assert!(Lattice::set_of([ClassRef::user("A")]).includes(&a));
    assert!(!Lattice::set_of([ClassRef::user("B")]).includes(&a));
    assert!(!Lattice::set_of([BuiltinClass::Integer]).includes(&ConstValue::Int(1)));
}

#[test]
fn test_includes_class() {
    let int = ClassRef::Builtin(BuiltinClass::Integer);
    assert!(Lattice::int(3).includes_class(&int));
    assert!(Lattice::set_of([BuiltinClass::Integer]).includes_class(&int));
    assert!(!Lattice::nil().includes_class(&int));
    assert!(!Lattice::Unknown.includes_class(&int));
}

#[test]
fn test_subsumption_order() {
    let all = samples();
    for a in &all {
        assert!(a.is_subsumed_by(a), "{a} ≤ {a}");
        assert!(Lattice::Unknown.is_subsumed_by(a));
        assert!(a.is_subsumed_by(&Lattice::Dynamic));
        for b in &all {
            for c in &all {
                if a.is_subsumed_by(b) && b.is_subsumed_by(c) {
                    assert!(a.is_subsumed_by(c), "{a} ≤ {b} ≤ {c} but not {a} ≤ {c}");
                }
            }
        }
    }
    let ab = Lattice::set_of([ClassRef::user("A"), ClassRef::user("B")]);
    assert!(Lattice::set_of([ClassRef::user("A")]).is_subsumed_by(&ab));
    assert!(!ab.is_subsumed_by(&Lattice::set_of([ClassRef::user("A")])));
    assert!(!Lattice::int(1).is_subsumed_by(&Lattice::int(2)));
    assert!(!Lattice::int(1).is_subsumed_by(&Lattice::set_of([BuiltinClass::Integer])));
}

#[test]
fn test_class_queries() {
    let num = Lattice::set_of([BuiltinClass::Integer, BuiltinClass::Float]);
    assert!(num.only_classes(&[BuiltinClass::Integer, BuiltinClass::Float]));
    assert!(!num.only_classes(&[BuiltinClass::Integer]));
    assert!(Lattice::int(7).only_classes(&[BuiltinClass::Integer]));
    assert!(!Lattice::Dynamic.only_classes(&[BuiltinClass::Integer]));
    assert!(!Lattice::Unknown.only_builtin());
    assert!(!Lattice::set_of([ClassRef::user("A")]).only_builtin());
    assert!(num.may_be(BuiltinClass::Float));
    assert_eq!(
        Lattice::class_object(ClassRef::user("A")).as_user_class(),
        Some("A")
    );
}

#[test]
fn test_display() {
    assert_eq!(Lattice::Unknown.to_string(), "<unknown>");
    assert_eq!(Lattice::Dynamic.to_string(), "<dynamic>");
    assert_eq!(Lattice::int(-4).to_string(), "-4");
    assert_eq!(Lattice::float(2.0).to_string(), "2.0");
    assert_eq!(Lattice::string("hi").to_string(), "\"hi\"");
    assert_eq!(Lattice::boolean().to_string(), "{TrueClass, FalseClass}");
    assert_eq!(
        Lattice::class_object(ClassRef::Builtin(BuiltinClass::Array)).to_string(),
        "Array"
    );
}

#[test]
fn test_builtin_names() {
    for class in BuiltinClass::ALL {
        assert_eq!(BuiltinClass::from_name(class.name()), Some(class));
    }
    assert_eq!(BuiltinClass::from_name("Hello"), None);
}
