//! Compilation session state.
//!
//! A [`Session`] owns everything one compilation produces: both arenas, the
//! program-wide variable tables, the dispatch registry and the list of
//! functions to emit. It is created per compilation, passed by `&mut` through
//! the typing pass and read by the code generator.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::dispatch::DispatchRegistry;
use crate::hir::{HirArena, HirId, HirKind, Owner, VarArena, VarId, VarKind};
use crate::lattice::{BuiltinClass, ClassRef, Lattice};
use crate::output::CompileStats;

/// A compiled method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEntry {
    pub owner: Owner,
    /// Serial of the class body that defines it; `None` at top level
    pub opening: Option<usize>,
    pub name: String,
    pub arity: usize,
    pub decl: HirId,
}

/// State of one compilation.
#[derive(Debug, Default)]
pub struct Session {
    pub hir: HirArena,
    pub vars: VarArena,
    pub registry: DispatchRegistry,
    pub stats: CompileStats,
    pub warnings: Vec<String>,
    globals: Vec<(String, VarId)>,
    constants: Vec<(String, VarId)>,
    global_decls: Vec<HirId>,
    class_vars: Vec<((String, String), VarId)>,
    classes: Vec<String>,
    class_serials: BTreeMap<String, usize>,
    methods: Vec<MethodEntry>,
    class_defs: Vec<HirId>,
    class_inits: Vec<HirId>,
    main: Option<HirId>,
    temp_counter: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a `$global`, creating an `Unknown` binding on first reference.
    pub fn lookup_global(&mut self, name: &str, line: u32) -> VarId {
        if let Some((_, id)) = self.globals.iter().find(|(n, _)| n == name) {
            return *id;
        }
        let id = self.vars.alloc(name, VarKind::Global, Lattice::Unknown);
        self.globals.push((name.to_string(), id));
        self.declare_global(id, line);
        id
    }

    /// Resolve a constant. A constant naming a builtin class starts out as
    /// that class object; any other starts `Unknown`.
    pub fn lookup_constant(&mut self, name: &str, line: u32) -> VarId {
        if let Some((_, id)) = self.constants.iter().find(|(n, _)| n == name) {
            return *id;
        }
        let lattice = match BuiltinClass::from_name(name) {
            Some(builtin) => Lattice::class_object(ClassRef::Builtin(builtin)),
            None => Lattice::Unknown,
        };
        let id = self.vars.alloc(name, VarKind::Constant, lattice);
        self.constants.push((name.to_string(), id));
        self.declare_global(id, line);
        id
    }

    fn declare_global(&mut self, var: VarId, line: u32) {
        let lattice = self.vars.lattice(var).clone();
        let decl = self.hir.alloc(HirKind::GlobalDecl { var }, lattice, line);
        self.global_decls.push(decl);
    }

    /// Resolve a `@@class_var` of `class`, creating it on first reference.
    pub fn lookup_class_var(&mut self, class: &str, name: &str) -> VarId {
        if let Some((_, id)) = self
            .class_vars
            .iter()
            .find(|((c, n), _)| c == class && n == name)
        {
            return *id;
        }
        let id = self.vars.alloc(name, VarKind::ClassLevel, Lattice::Unknown);
        self.class_vars
            .push(((class.to_string(), name.to_string()), id));
        id
    }

    /// Class whose table holds a class variable.
    pub fn class_var_owner(&self, var: VarId) -> Option<&str> {
        self.class_vars
            .iter()
            .find(|(_, id)| *id == var)
            .map(|((class, _), _)| class.as_str())
    }

    /// Record a `class` body for `name`; returns its serial (0 for the first
    /// opening, 1 for the first reopening, ...).
    pub fn open_class(&mut self, name: &str) -> usize {
        if !self.classes.iter().any(|c| c == name) {
            self.classes.push(name.to_string());
        }
        let serial = self.class_serials.entry(name.to_string()).or_insert(0);
        let current = *serial;
        *serial += 1;
        current
    }

    /// Register a compiled method. A later body for the same owner and key
    /// replaces the earlier one within one class body (or at top level);
    /// each reopening of a class keeps its own body, since the runtime
    /// table holds the older one until the reopening runs.
    pub fn define_method(
        &mut self,
        owner: Owner,
        opening: Option<usize>,
        name: &str,
        arity: usize,
        decl: HirId,
    ) {
        self.registry.declare(owner.clone(), name, arity);
        if let Some(entry) = self.methods.iter_mut().find(|m| {
            m.owner == owner && m.opening == opening && m.name == name && m.arity == arity
        }) {
            debug!(method = name, arity, "method redefined");
            entry.decl = decl;
            return;
        }
        if self.method(&owner, name, arity).is_some() {
            debug!(method = name, arity, ?opening, "method redefined by a reopened class");
        }
        self.methods.push(MethodEntry {
            owner,
            opening,
            name: name.to_string(),
            arity,
            decl,
        });
    }

    pub fn add_class_def(&mut self, def: HirId, initializer: HirId) {
        self.class_defs.push(def);
        self.class_inits.push(initializer);
    }

    pub fn set_main(&mut self, main: HirId) {
        self.main = Some(main);
    }

    /// A local name that cannot collide with source identifiers.
    pub fn fresh_temp(&mut self, prefix: &str) -> String {
        let name = format!("{}#{}", prefix, self.temp_counter);
        self.temp_counter += 1;
        name
    }

    pub fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Methods in first-definition order.
    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    /// First compiled method for an exact owner and key.
    pub fn method(&self, owner: &Owner, name: &str, arity: usize) -> Option<&MethodEntry> {
        self.methods
            .iter()
            .find(|m| &m.owner == owner && m.name == name && m.arity == arity)
    }

    /// The body a receiver of `class` always reaches for a key: the only
    /// one compiled, defined when the class is first created. Bodies from
    /// reopenings are reached through the runtime method table.
    pub fn fixed_body(&self, class: &str, name: &str, arity: usize) -> Option<&MethodEntry> {
        let mut bodies = self.methods.iter().filter(|m| {
            m.owner.as_deref() == Some(class) && m.name == name && m.arity == arity
        });
        match (bodies.next(), bodies.next()) {
            (Some(entry), None) if entry.opening == Some(0) => Some(entry),
            _ => None,
        }
    }

    /// Methods declared by top-level `def`.
    pub fn top_level_methods(&self) -> impl Iterator<Item = &MethodEntry> {
        self.methods.iter().filter(|m| m.owner.is_none())
    }

    /// User classes in first-opening order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_defs(&self) -> &[HirId] {
        &self.class_defs
    }

    pub fn class_inits(&self) -> &[HirId] {
        &self.class_inits
    }

    pub fn global_decls(&self) -> &[HirId] {
        &self.global_decls
    }

    pub fn main(&self) -> Option<HirId> {
        self.main
    }
}
