//! Typed high-level IR.
//!
//! Nodes live in a [`HirArena`] owned by the compilation session and refer to
//! each other by [`HirId`]. Variables live in a separate [`VarArena`] so that
//! scope frames can share a binding and widen its lattice as assignments are
//! typed. Every node records the lattice computed when it was built.

pub mod printer;

use serde::Serialize;
use std::ops::Index;

use crate::lattice::Lattice;

/// Index of a node in the [`HirArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HirId(u32);

/// Index of a variable in the [`VarArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(u32);

impl HirId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Storage class of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VarKind {
    Local,
    Param,
    Global,
    Constant,
    Instance,
    ClassLevel,
}

/// A named binding with its current (widening) lattice.
#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lattice: Lattice,
}

/// Owner of a function: a user class, or none for top-level definitions.
pub type Owner = Option<String>;

/// What a function declaration is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FunctionRole {
    /// A method, keyed in the dispatch registry. `opening` is the serial
    /// of the class body defining it.
    Method {
        owner: Owner,
        opening: Option<usize>,
    },
    /// The statements of one `class` body
    ClassInit { class: String, serial: usize },
    /// The top-level program
    Main,
}

/// Literal payloads; numeric text is kept for exact re-emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int { text: String, base: u32, value: i64 },
    Float { text: String, value: f64 },
    Str { text: String, len: usize },
    Nil,
    True,
    False,
}

/// Primitive runtime operations reachable without dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrimOp {
    NumAdd,
    NumSub,
    NumMul,
    NumDiv,
    NumLt,
    NumLe,
    NumGt,
    NumGe,
    NumEq,
    NumNeg,
    Not,
    AryGet,
    AryAset,
    AryNew,
    StrPlus,
}

impl PrimOp {
    /// Runtime function implementing the operation.
    pub fn runtime_name(self) -> &'static str {
        match self {
            PrimOp::NumAdd => "num_add",
            PrimOp::NumSub => "num_sub",
            PrimOp::NumMul => "num_mul",
            PrimOp::NumDiv => "num_div",
            PrimOp::NumLt => "num_lt",
            PrimOp::NumLe => "num_le",
            PrimOp::NumGt => "num_gt",
            PrimOp::NumGe => "num_ge",
            PrimOp::NumEq => "num_eq",
            PrimOp::NumNeg => "num_neg",
            PrimOp::Not => "mrb_bob_not",
            PrimOp::AryGet => "hpc_ary_aget",
            PrimOp::AryAset => "hpc_ary_aset",
            PrimOp::AryNew => "mrb_ary_new_from_values",
            PrimOp::StrPlus => "hpc_str_plus",
        }
    }
}

/// Call target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Callee {
    /// Direct call of a runtime primitive
    Prim(PrimOp),
    /// Call through the multiplexer for (name, argument count)
    Dispatch(String),
    /// Allocation plus `initialize` through the per-arity constructor
    Construct,
}

/// Node kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HirKind {
    // ==================== Declarations ====================
    GlobalDecl {
        var: VarId,
    },
    LocalDecl {
        var: VarId,
        init: Option<HirId>,
    },
    ParamDecl {
        var: VarId,
    },
    FunctionDecl {
        role: FunctionRole,
        name: String,
        params: Vec<HirId>,
        body: HirId,
        return_type: Lattice,
    },

    // ==================== Statements ====================
    Block(Vec<HirId>),
    Scope {
        decls: Vec<HirId>,
        body: HirId,
    },
    Assign {
        target: VarId,
        value: HirId,
    },
    IfElse {
        cond: HirId,
        then_branch: HirId,
        else_branch: Option<HirId>,
    },
    CountedLoop {
        var: VarId,
        low: HirId,
        high: HirId,
        body: HirId,
    },
    While {
        cond: HirId,
        body: HirId,
    },
    Break,
    Continue,
    Return(Option<HirId>),
    /// Creates the class object at run time, registers its compiled methods
    /// and runs its initializer
    DefClass {
        name: String,
        serial: usize,
        methods: Vec<(String, usize)>,
        initializer: HirId,
    },

    // ==================== Expressions ====================
    Empty,
    Literal(Literal),
    Var(VarId),
    SelfRef,
    /// `args[0]` is the receiver
    Call {
        callee: Callee,
        args: Vec<HirId>,
    },
    CondOp {
        cond: HirId,
        then_value: HirId,
        else_value: HirId,
    },
}

impl HirKind {
    /// Nodes evaluated as part of this one. Function bodies and class
    /// initializers are separate functions and are not included.
    pub fn children(&self) -> Vec<HirId> {
        match self {
            HirKind::LocalDecl { init, .. } => init.iter().copied().collect(),
            HirKind::Block(stmts) => stmts.clone(),
            HirKind::Scope { decls, body } => {
                let mut out = decls.clone();
                out.push(*body);
                out
            }
            HirKind::Assign { value, .. } => vec![*value],
            HirKind::IfElse {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![*cond, *then_branch];
                out.extend(else_branch.iter().copied());
                out
            }
            HirKind::CountedLoop {
                low, high, body, ..
            } => vec![*low, *high, *body],
            HirKind::While { cond, body } => vec![*cond, *body],
            HirKind::Return(value) => value.iter().copied().collect(),
            HirKind::Call { args, .. } => args.clone(),
            HirKind::CondOp {
                cond,
                then_value,
                else_value,
            } => vec![*cond, *then_value, *else_value],
            HirKind::GlobalDecl { .. }
            | HirKind::ParamDecl { .. }
            | HirKind::FunctionDecl { .. }
            | HirKind::Break
            | HirKind::Continue
            | HirKind::DefClass { .. }
            | HirKind::Empty
            | HirKind::Literal(_)
            | HirKind::Var(_)
            | HirKind::SelfRef => Vec::new(),
        }
    }
}

/// A node with its lattice annotation and source line.
#[derive(Debug, Clone, Serialize)]
pub struct HirNode {
    pub kind: HirKind,
    pub lattice: Lattice,
    pub line: u32,
}

/// Arena of HIR nodes for one session.
#[derive(Debug, Default)]
pub struct HirArena {
    nodes: Vec<HirNode>,
}

impl HirArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: HirKind, lattice: Lattice, line: u32) -> HirId {
        let id = HirId(self.nodes.len() as u32);
        self.nodes.push(HirNode {
            kind,
            lattice,
            line,
        });
        id
    }

    pub fn get(&self, id: HirId) -> Option<&HirNode> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: HirId) -> &HirKind {
        &self[id].kind
    }

    pub fn lattice(&self, id: HirId) -> &Lattice {
        &self[id].lattice
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node in allocation order, including ones no function reaches.
    pub fn iter(&self) -> impl Iterator<Item = (HirId, &HirNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (HirId(i as u32), node))
    }
}

impl Index<HirId> for HirArena {
    type Output = HirNode;

    fn index(&self, id: HirId) -> &HirNode {
        &self.nodes[id.index()]
    }
}

/// Arena of variables for one session.
#[derive(Debug, Default)]
pub struct VarArena {
    vars: Vec<Variable>,
}

impl VarArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, name: impl Into<String>, kind: VarKind, lattice: Lattice) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(Variable {
            name: name.into(),
            kind,
            lattice,
        });
        id
    }

    pub fn name(&self, id: VarId) -> &str {
        &self[id].name
    }

    pub fn kind(&self, id: VarId) -> VarKind {
        self[id].kind
    }

    pub fn lattice(&self, id: VarId) -> &Lattice {
        &self[id].lattice
    }

    /// Join `lattice` into the variable; returns true if it widened.
    pub fn widen(&mut self, id: VarId, lattice: &Lattice) -> bool {
        self.vars[id.index()].lattice.join_in_place(lattice)
    }

    pub fn set_lattice(&mut self, id: VarId, lattice: Lattice) {
        self.vars[id.index()].lattice = lattice;
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Index<VarId> for VarArena {
    type Output = Variable;

    fn index(&self, id: VarId) -> &Variable {
        &self.vars[id.index()]
    }
}
