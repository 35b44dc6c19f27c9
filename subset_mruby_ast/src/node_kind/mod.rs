//! Node kinds of the consumed syntax tree
//!
//! Tag names follow the mruby parser's node types in lower case.

mod convert;
mod predicates;


use serde::{Deserialize, Serialize};

/// Syntax tree node kinds
///
/// Child layout per kind (`[..]` is a list child, `?` an optional child
/// that is absent or `nil`):
///
/// ```text
/// (scope [locals] body)          (begin stmt*)
/// (call recv name [args] block?) (fcall name [args] block?)
/// (block [params] body)          (int "digits" base)
/// (float "text")                 (str "text")
/// (lvar x) (ivar @x) (gvar $x) (cvar @@x) (const X)
/// (asgn target value)            (op_asgn target op value)
/// (if cond then else?)           (unless cond then else?)
/// (while cond body)              (until cond body)
/// (break value?) (next) (return value?)
/// (and lhs rhs) (or lhs rhs) (not expr) (negate expr)
/// (def name [params] body)       (class Name super? body)
/// (module Name body)             (array elem*)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    // ==================== Structure ====================
    /// Local variable table plus body
    Scope,
    /// Statement sequence
    Begin,

    // ==================== Calls ====================
    /// recv.name(args)
    Call,
    /// name(args) with implicit receiver
    Fcall,
    /// { |params| body } attached to a call
    Block,

    // ==================== Literals ====================
    Int,
    Float,
    Str,
    Nil,
    True,
    False,
    /// self
    #[serde(rename = "self")]
    SelfRef,
    /// [a, b, c]
    Array,

    // ==================== Variables ====================
    Lvar,
    Ivar,
    Gvar,
    Cvar,
    Const,

    // ==================== Assignment ====================
    Asgn,
    /// x += 1, x ||= v
    OpAsgn,

    // ==================== Control Flow ====================
    If,
    Unless,
    While,
    Until,
    Break,
    Next,
    Return,
    And,
    Or,
    Not,
    /// Unary minus
    Negate,

    // ==================== Definitions ====================
    Def,
    Class,
    Module,

    // ==================== Outside the subset ====================
    Sym,
    Hash,
    Dstr,
    Xstr,
    Regx,
    Yield,
    Super,
    Zsuper,
    Case,
    Rescue,
    Ensure,
    For,
    Splat,
    Redo,
    Retry,
    Lambda,
    Sdef,
    Sclass,
    Alias,
    Undef,
    Dot2,
    Dot3,
    Colon2,
    Colon3,
    Masgn,
    BlockPass,
    NthRef,
    BackRef,
    Postexe,
}

impl NodeKind {
    /// Get all NodeKind variants
    ///
    /// The exhaustive match in `variant_count()` fails to compile when a
    /// variant is added without updating this list.
    pub fn all_variants() -> &'static [NodeKind] {
        &[
            NodeKind::Scope,
            NodeKind::Begin,
            NodeKind::Call,
            NodeKind::Fcall,
            NodeKind::Block,
            NodeKind::Int,
            NodeKind::Float,
            NodeKind::Str,
            NodeKind::Nil,
            NodeKind::True,
            NodeKind::False,
            NodeKind::SelfRef,
            NodeKind::Array,
            NodeKind::Lvar,
            NodeKind::Ivar,
            NodeKind::Gvar,
            NodeKind::Cvar,
            NodeKind::Const,
            NodeKind::Asgn,
            NodeKind::OpAsgn,
            NodeKind::If,
            NodeKind::Unless,
            NodeKind::While,
            NodeKind::Until,
            NodeKind::Break,
            NodeKind::Next,
            NodeKind::Return,
            NodeKind::And,
            NodeKind::Or,
            NodeKind::Not,
            NodeKind::Negate,
            NodeKind::Def,
            NodeKind::Class,
            NodeKind::Module,
            NodeKind::Sym,
            NodeKind::Hash,
            NodeKind::Dstr,
            NodeKind::Xstr,
            NodeKind::Regx,
            NodeKind::Yield,
            NodeKind::Super,
            NodeKind::Zsuper,
            NodeKind::Case,
            NodeKind::Rescue,
            NodeKind::Ensure,
            NodeKind::For,
            NodeKind::Splat,
            NodeKind::Redo,
            NodeKind::Retry,
            NodeKind::Lambda,
            NodeKind::Sdef,
            NodeKind::Sclass,
            NodeKind::Alias,
            NodeKind::Undef,
            NodeKind::Dot2,
            NodeKind::Dot3,
            NodeKind::Colon2,
            NodeKind::Colon3,
            NodeKind::Masgn,
            NodeKind::BlockPass,
            NodeKind::NthRef,
            NodeKind::BackRef,
            NodeKind::Postexe,
        ]
    }

    #[cfg(test)]
    fn variant_count() -> usize {
        fn _exhaustive_check(k: NodeKind) -> u8 {
            match k {
                NodeKind::Scope
                | NodeKind::Begin
                | NodeKind::Call
                | NodeKind::Fcall
                | NodeKind::Block
                | NodeKind::Int
                | NodeKind::Float
                | NodeKind::Str
                | NodeKind::Nil
                | NodeKind::True
                | NodeKind::False
                | NodeKind::SelfRef
                | NodeKind::Array
                | NodeKind::Lvar
                | NodeKind::Ivar
                | NodeKind::Gvar
                | NodeKind::Cvar
                | NodeKind::Const
                | NodeKind::Asgn
                | NodeKind::OpAsgn
                | NodeKind::If
                | NodeKind::Unless
                | NodeKind::While
                | NodeKind::Until
                | NodeKind::Break
                | NodeKind::Next
                | NodeKind::Return
                | NodeKind::And
                | NodeKind::Or
                | NodeKind::Not
                | NodeKind::Negate
                | NodeKind::Def
                | NodeKind::Class
                | NodeKind::Module => 0,
                NodeKind::Sym
                | NodeKind::Hash
                | NodeKind::Dstr
                | NodeKind::Xstr
                | NodeKind::Regx
                | NodeKind::Yield
                | NodeKind::Super
                | NodeKind::Zsuper
                | NodeKind::Case
                | NodeKind::Rescue
                | NodeKind::Ensure
                | NodeKind::For
                | NodeKind::Splat
                | NodeKind::Redo
                | NodeKind::Retry
                | NodeKind::Lambda
                | NodeKind::Sdef
                | NodeKind::Sclass
                | NodeKind::Alias
                | NodeKind::Undef
                | NodeKind::Dot2
                | NodeKind::Dot3
                | NodeKind::Colon2
                | NodeKind::Colon3
                | NodeKind::Masgn
                | NodeKind::BlockPass
                | NodeKind::NthRef
                | NodeKind::BackRef
                | NodeKind::Postexe => 1,
            }
        }
        NodeKind::all_variants().len()
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
