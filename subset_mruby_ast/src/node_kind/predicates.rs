//! NodeKind predicate methods

use super::NodeKind;

impl NodeKind {
    /// Check if the compiler models this kind at all
    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
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
                | NodeKind::Postexe
        )
    }

    /// Check if this is a literal node
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::Int
                | NodeKind::Float
                | NodeKind::Str
                | NodeKind::Nil
                | NodeKind::True
                | NodeKind::False
        )
    }

    /// Check if this is a variable reference
    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            NodeKind::Lvar | NodeKind::Ivar | NodeKind::Gvar | NodeKind::Cvar | NodeKind::Const
        )
    }

    /// Check if this is a loop construct
    pub fn is_loop(&self) -> bool {
        matches!(self, NodeKind::While | NodeKind::Until)
    }

    /// Check if this is a definition node
    pub fn is_definition(&self) -> bool {
        matches!(self, NodeKind::Def | NodeKind::Class | NodeKind::Module)
    }
}
