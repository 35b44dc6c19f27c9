//! Lattice operations: join (⊔), inclusion and subsumption (⊑).

use super::types::{BuiltinClass, ClassRef, ClassSet, ConstValue, Lattice};

impl Lattice {
    /// Join operation (⊔): the least value covering both inputs.
    ///
    /// # Examples
    /// ```text
    /// Unknown ⊔ x        = x
    /// Dynamic ⊔ x        = Dynamic
    /// 1 ⊔ 1              = 1
    /// 1 ⊔ 2              = {Integer}
    /// 1 ⊔ "a"            = {Integer, String}
    /// {Integer} ⊔ 2.5    = {Integer, Float}
    /// {A} ⊔ {B}          = {A, B}
    /// ```
    pub fn join(&self, other: &Lattice) -> Lattice {
        match (self, other) {
            (Lattice::Unknown, x) | (x, Lattice::Unknown) => x.clone(),

            (Lattice::Dynamic, _) | (_, Lattice::Dynamic) => Lattice::Dynamic,

            (Lattice::Constant(a), Lattice::Constant(b)) if a == b => self.clone(),

            (Lattice::Constant(a), Lattice::Constant(b)) => {
                Lattice::Set([a.class(), b.class()].into_iter().collect())
            }

            (Lattice::Set(set), Lattice::Constant(v)) | (Lattice::Constant(v), Lattice::Set(set)) => {
                let mut joined = set.clone();
                joined.insert(v.class());
                Lattice::Set(joined)
            }

            (Lattice::Set(a), Lattice::Set(b)) => {
                let mut joined = a.clone();
                for class in b {
                    joined.insert(class.clone());
                }
                Lattice::Set(joined)
            }
        }
    }

    /// Join `other` into `self` in place; returns true if `self` changed.
    pub fn join_in_place(&mut self, other: &Lattice) -> bool {
        let joined = self.join(other);
        if joined == *self {
            false
        } else {
            *self = joined;
            true
        }
    }

    /// Whether a concrete value is covered by this lattice value.
    ///
    /// A set covers a class object whose class is one of its elements.
    pub fn includes(&self, value: &ConstValue) -> bool {
        match self {
            Lattice::Unknown => false,
            Lattice::Dynamic => true,
            Lattice::Constant(c) => c == value,
            Lattice::Set(set) => value.as_class().is_some_and(|c| set.contains(c)),
        }
    }

    /// Whether instances of `class` may be described by this value.
    pub fn includes_class(&self, class: &ClassRef) -> bool {
        match self {
            Lattice::Unknown => false,
            Lattice::Dynamic => true,
            Lattice::Constant(c) => &c.class() == class,
            Lattice::Set(set) => set.contains(class),
        }
    }

    /// Subsumption (⊑).
    ///
    /// `Unknown` is below everything and everything is below `Dynamic`;
    /// otherwise both sides must be the same variant: equal constants, or a
    /// set whose elements all occur in the other set.
    pub fn is_subsumed_by(&self, other: &Lattice) -> bool {
        match (self, other) {
            (Lattice::Unknown, _) | (_, Lattice::Dynamic) => true,
            (Lattice::Constant(a), Lattice::Constant(b)) => a == b,
            (Lattice::Set(a), Lattice::Set(b)) => a.is_subset(b),
            _ => false,
        }
    }

    /// Whether the value is known precisely enough to specialize on.
    pub fn is_resolved(&self) -> bool {
        match self {
            Lattice::Constant(_) => true,
            Lattice::Set(set) => !set.is_empty(),
            Lattice::Unknown | Lattice::Dynamic => false,
        }
    }

    /// The classes a resolved value may have, in a stable order.
    pub fn classes(&self) -> Option<ClassSet> {
        match self {
            Lattice::Constant(v) => Some([v.class()].into_iter().collect()),
            Lattice::Set(set) if !set.is_empty() => Some(set.clone()),
            _ => None,
        }
    }

    /// Whether the value is resolved and every possible class is in `allowed`.
    pub fn only_classes(&self, allowed: &[BuiltinClass]) -> bool {
        match self.classes() {
            Some(set) => set
                .iter()
                .all(|c| c.builtin().is_some_and(|b| allowed.contains(&b))),
            None => false,
        }
    }

    /// Whether the value is resolved to builtin classes only.
    pub fn only_builtin(&self) -> bool {
        self.classes()
            .is_some_and(|set| set.iter().all(ClassRef::is_builtin))
    }

    /// Whether a resolved value may be an instance of `class`.
    pub fn may_be(&self, class: BuiltinClass) -> bool {
        self.classes()
            .is_some_and(|set| set.contains(&ClassRef::Builtin(class)))
    }

    /// The user class named by a constant class object, if any.
    pub fn as_user_class(&self) -> Option<&str> {
        match self {
            Lattice::Constant(ConstValue::Class(ClassRef::User(name))) => Some(name),
            _ => None,
        }
    }
}
