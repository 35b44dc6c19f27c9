//! Lattice value definitions.

use serde::Serialize;
use std::fmt;

/// Classes the runtime provides before any user code runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BuiltinClass {
    Object,
    NilClass,
    TrueClass,
    FalseClass,
    Integer,
    Float,
    String,
    Symbol,
    Array,
    Hash,
    Range,
    Proc,
    Class,
}

impl BuiltinClass {
    pub const ALL: [BuiltinClass; 13] = [
        BuiltinClass::Object,
        BuiltinClass::NilClass,
        BuiltinClass::TrueClass,
        BuiltinClass::FalseClass,
        BuiltinClass::Integer,
        BuiltinClass::Float,
        BuiltinClass::String,
        BuiltinClass::Symbol,
        BuiltinClass::Array,
        BuiltinClass::Hash,
        BuiltinClass::Range,
        BuiltinClass::Proc,
        BuiltinClass::Class,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinClass::Object => "Object",
            BuiltinClass::NilClass => "NilClass",
            BuiltinClass::TrueClass => "TrueClass",
            BuiltinClass::FalseClass => "FalseClass",
            BuiltinClass::Integer => "Integer",
            BuiltinClass::Float => "Float",
            BuiltinClass::String => "String",
            BuiltinClass::Symbol => "Symbol",
            BuiltinClass::Array => "Array",
            BuiltinClass::Hash => "Hash",
            BuiltinClass::Range => "Range",
            BuiltinClass::Proc => "Proc",
            BuiltinClass::Class => "Class",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, BuiltinClass::Integer | BuiltinClass::Float)
    }
}

/// A runtime class: builtin, or user-defined and named by its constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ClassRef {
    Builtin(BuiltinClass),
    User(String),
}

impl ClassRef {
    pub fn user(name: impl Into<String>) -> Self {
        ClassRef::User(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            ClassRef::Builtin(b) => b.name(),
            ClassRef::User(name) => name,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, ClassRef::Builtin(_))
    }

    pub fn builtin(&self) -> Option<BuiltinClass> {
        match self {
            ClassRef::Builtin(b) => Some(*b),
            ClassRef::User(_) => None,
        }
    }
}

impl From<BuiltinClass> for ClassRef {
    fn from(b: BuiltinClass) -> Self {
        ClassRef::Builtin(b)
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal value known at compile time.
#[derive(Debug, Clone, Serialize)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Str(String),
    Nil,
    True,
    False,
    /// A class object
    Class(ClassRef),
    /// The top-level `main` object
    Main,
}

// Floats compare by bit pattern so that join stays idempotent for NaN.
impl PartialEq for ConstValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConstValue::Int(a), ConstValue::Int(b)) => a == b,
            (ConstValue::Float(a), ConstValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ConstValue::Str(a), ConstValue::Str(b)) => a == b,
            (ConstValue::Class(a), ConstValue::Class(b)) => a == b,
            (ConstValue::Nil, ConstValue::Nil)
            | (ConstValue::True, ConstValue::True)
            | (ConstValue::False, ConstValue::False)
            | (ConstValue::Main, ConstValue::Main) => true,
            _ => false,
        }
    }
}

impl Eq for ConstValue {}

impl std::hash::Hash for ConstValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ConstValue::Int(v) => v.hash(state),
            ConstValue::Float(v) => v.to_bits().hash(state),
            ConstValue::Str(v) => v.hash(state),
            ConstValue::Class(c) => c.hash(state),
            ConstValue::Nil | ConstValue::True | ConstValue::False | ConstValue::Main => {}
        }
    }
}

impl ConstValue {
    /// The runtime class of this value.
    pub fn class(&self) -> ClassRef {
        ClassRef::Builtin(match self {
            ConstValue::Int(_) => BuiltinClass::Integer,
            ConstValue::Float(_) => BuiltinClass::Float,
            ConstValue::Str(_) => BuiltinClass::String,
            ConstValue::Nil => BuiltinClass::NilClass,
            ConstValue::True => BuiltinClass::TrueClass,
            ConstValue::False => BuiltinClass::FalseClass,
            ConstValue::Class(_) => BuiltinClass::Class,
            ConstValue::Main => BuiltinClass::Object,
        })
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            ConstValue::Class(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{}", v),
            ConstValue::Float(v) => write!(f, "{:?}", v),
            ConstValue::Str(s) => write!(f, "{:?}", s),
            ConstValue::Nil => f.write_str("nil"),
            ConstValue::True => f.write_str("true"),
            ConstValue::False => f.write_str("false"),
            ConstValue::Class(c) => write!(f, "{}", c),
            ConstValue::Main => f.write_str("main"),
        }
    }
}

/// A duplicate-free collection of classes.
///
/// Equality ignores order; iteration follows insertion order so that
/// generated code is deterministic.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ClassSet(Vec<ClassRef>);

impl ClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a class; returns false if it was already present.
    pub fn insert(&mut self, class: ClassRef) -> bool {
        if self.0.contains(&class) {
            false
        } else {
            self.0.push(class);
            true
        }
    }

    pub fn contains(&self, class: &ClassRef) -> bool {
        self.0.contains(class)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClassRef> {
        self.0.iter()
    }

    pub fn is_subset(&self, other: &ClassSet) -> bool {
        self.0.iter().all(|c| other.contains(c))
    }
}

impl PartialEq for ClassSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl Eq for ClassSet {}

impl FromIterator<ClassRef> for ClassSet {
    fn from_iter<I: IntoIterator<Item = ClassRef>>(iter: I) -> Self {
        let mut set = ClassSet::new();
        for class in iter {
            set.insert(class);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ClassSet {
    type Item = &'a ClassRef;
    type IntoIter = std::slice::Iter<'a, ClassRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Abstract value of an expression or variable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Lattice {
    /// Bottom: nothing known yet
    #[default]
    Unknown,
    /// Top: any class
    Dynamic,
    Constant(ConstValue),
    Set(ClassSet),
}

impl Lattice {
    pub fn int(v: i64) -> Self {
        Lattice::Constant(ConstValue::Int(v))
    }

    pub fn float(v: f64) -> Self {
        Lattice::Constant(ConstValue::Float(v))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Lattice::Constant(ConstValue::Str(s.into()))
    }

    pub fn nil() -> Self {
        Lattice::Constant(ConstValue::Nil)
    }

    /// A class object as a value
    pub fn class_object(class: ClassRef) -> Self {
        Lattice::Constant(ConstValue::Class(class))
    }

    /// Instances of exactly the given classes
    pub fn set_of<I, C>(classes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClassRef>,
    {
        Lattice::Set(classes.into_iter().map(Into::into).collect())
    }

    pub fn boolean() -> Self {
        Lattice::set_of([BuiltinClass::TrueClass, BuiltinClass::FalseClass])
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Lattice::Unknown)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Lattice::Dynamic)
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lattice::Unknown => f.write_str("<unknown>"),
            Lattice::Dynamic => f.write_str("<dynamic>"),
            Lattice::Constant(v) => write!(f, "{}", v),
            Lattice::Set(set) => {
                f.write_str("{")?;
                for (i, class) in set.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", class)?;
                }
                f.write_str("}")
            }
        }
    }
}
