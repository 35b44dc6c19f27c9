//! Lexical scope frames.
//!
//! A [`Frame`] holds the locals introduced by one scope and links to its
//! enclosing frame. Bindings are [`VarId`]s into the session's
//! [`VarArena`], so a nested frame that assigns an outer local widens the same
//! variable the outer frame sees.
//!
//! Conditional branches use [`Frame::duplicate`] and [`Frame::merge`]: the
//! duplicate holds fresh variables carrying copies of every visible local's
//! lattice, one arm is typed in each frame, and merging joins the results
//! back into the original bindings.


use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::hir::{VarArena, VarId, VarKind};
use crate::lattice::Lattice;

/// Instance variables referenced so far by one method, shared by every frame
/// nested inside it.
pub type IvarTable = Rc<RefCell<Vec<(String, VarId)>>>;

/// One lexical frame.
#[derive(Debug)]
pub struct Frame<'p> {
    locals: Vec<(String, VarId)>,
    parent: Option<&'p Frame<'p>>,
    /// Next free slot; slot 0 is the receiver
    sp: usize,
    class_name: Option<String>,
    self_lattice: Lattice,
    ivars: IvarTable,
}

impl Frame<'static> {
    /// A frame that starts a new method, class body or program.
    pub fn root(
        locals: Vec<(String, VarId)>,
        class_name: Option<String>,
        self_lattice: Lattice,
    ) -> Self {
        let sp = locals.len() + 1;
        Frame {
            locals,
            parent: None,
            sp,
            class_name,
            self_lattice,
            ivars: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<'p> Frame<'p> {
    /// A frame nested in `parent`, sharing its receiver and instance variables.
    pub fn new(parent: &'p Frame<'p>, locals: Vec<(String, VarId)>) -> Frame<'p> {
        let sp = locals.len() + 1;
        Frame {
            locals,
            parent: Some(parent),
            sp,
            class_name: parent.class_name.clone(),
            self_lattice: parent.self_lattice.clone(),
            ivars: Rc::clone(&parent.ivars),
        }
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn self_lattice(&self) -> &Lattice {
        &self.self_lattice
    }

    pub fn parent(&self) -> Option<&'p Frame<'p>> {
        self.parent
    }

    /// Locals introduced by this frame only.
    pub fn locals(&self) -> &[(String, VarId)] {
        &self.locals
    }

    /// Resolve a local by walking outward.
    pub fn lookup_local(&self, name: &str) -> Option<VarId> {
        let mut frame = Some(self);
        while let Some(f) = frame {
            if let Some((_, id)) = f.locals.iter().find(|(n, _)| n == name) {
                return Some(*id);
            }
            frame = f.parent;
        }
        None
    }

    /// Resolve an instance variable, creating an `Unknown` binding in the
    /// method's table on first reference.
    pub fn lookup_ivar(&self, name: &str, vars: &mut VarArena) -> VarId {
        if let Some((_, id)) = self.ivars.borrow().iter().find(|(n, _)| n == name) {
            return *id;
        }
        let id = vars.alloc(name, VarKind::Instance, Lattice::Unknown);
        trace!(ivar = name, "instance variable first referenced");
        self.ivars.borrow_mut().push((name.to_string(), id));
        id
    }

    /// Instance variables referenced so far in the enclosing method.
    pub fn ivars(&self) -> Vec<VarId> {
        self.ivars.borrow().iter().map(|(_, id)| *id).collect()
    }

    /// Every visible binding, innermost first. Shadowed names appear once per
    /// frame, and the innermost occurrence comes first.
    pub fn visible_bindings(&self) -> Vec<(String, VarId)> {
        let mut out = Vec::new();
        let mut frame = Some(self);
        while let Some(f) = frame {
            out.extend(f.locals.iter().cloned());
            frame = f.parent;
        }
        out
    }

    /// Lattices of every visible local and instance variable, for fixed-point
    /// comparison.
    pub fn lattice_snapshot(&self, vars: &VarArena) -> Vec<Lattice> {
        self.visible_bindings()
            .iter()
            .map(|(_, id)| vars.lattice(*id).clone())
            .chain(self.ivars().into_iter().map(|id| vars.lattice(id).clone()))
            .collect()
    }

    /// Variables of [`Frame::lattice_snapshot`], in the same order.
    pub fn snapshot_vars(&self) -> Vec<VarId> {
        self.visible_bindings()
            .into_iter()
            .map(|(_, id)| id)
            .chain(self.ivars())
            .collect()
    }

    /// A parallel frame whose bindings are fresh variables holding copies of
    /// every visible local's lattice. The receiver and instance variables are
    /// shared with `self`.
    pub fn duplicate(&self, vars: &mut VarArena) -> Frame<'static> {
        let locals: Vec<(String, VarId)> = self
            .visible_bindings()
            .into_iter()
            .map(|(name, id)| {
                let kind = vars.kind(id);
                let lattice = vars.lattice(id).clone();
                let copy = vars.alloc(name.clone(), kind, lattice);
                (name, copy)
            })
            .collect();
        Frame {
            sp: locals.len() + 1,
            locals,
            parent: None,
            class_name: self.class_name.clone(),
            self_lattice: self.self_lattice.clone(),
            ivars: Rc::clone(&self.ivars),
        }
    }

    /// Join `secondary`'s bindings into this frame's visible bindings,
    /// position by position. When exactly one side is still `Unknown`, that
    /// branch never assigned the variable, so it counts as `nil`.
    pub fn merge(&self, secondary: Frame<'_>, vars: &mut VarArena) {
        let primary = self.visible_bindings();
        let other = secondary.visible_bindings();
        debug_assert_eq!(primary.len(), other.len(), "merged frames must align");
        for ((name, p), (_, s)) in primary.iter().zip(other.iter()) {
            let left = vars.lattice(*p).clone();
            let right = vars.lattice(*s).clone();
            let merged = merge_lattices(&left, &right);
            if merged != left {
                trace!(var = name.as_str(), from = %left, to = %merged, "merged branch binding");
                vars.set_lattice(*p, merged);
            }
        }
    }
}

/// Join of two branch results where an untouched (`Unknown`) side is `nil`.
pub fn merge_lattices(left: &Lattice, right: &Lattice) -> Lattice {
    match (left.is_unknown(), right.is_unknown()) {
        (true, false) => Lattice::nil().join(right),
        (false, true) => left.join(&Lattice::nil()),
        _ => left.join(right),
    }
}
