//! NodeKind conversion methods (from_name, as_str)

use super::NodeKind;

impl NodeKind {
    /// Look up a kind by its tag name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "scope" => NodeKind::Scope,
            "begin" => NodeKind::Begin,
            "call" => NodeKind::Call,
            "fcall" => NodeKind::Fcall,
            "block" => NodeKind::Block,
            "int" => NodeKind::Int,
            "float" => NodeKind::Float,
            "str" => NodeKind::Str,
            "nil" => NodeKind::Nil,
            "true" => NodeKind::True,
            "false" => NodeKind::False,
            "self" => NodeKind::SelfRef,
            "array" => NodeKind::Array,
            "lvar" => NodeKind::Lvar,
            "ivar" => NodeKind::Ivar,
            "gvar" => NodeKind::Gvar,
            "cvar" => NodeKind::Cvar,
            "const" => NodeKind::Const,
            "asgn" => NodeKind::Asgn,
            "op_asgn" => NodeKind::OpAsgn,
            "if" => NodeKind::If,
            "unless" => NodeKind::Unless,
            "while" => NodeKind::While,
            "until" => NodeKind::Until,
            "break" => NodeKind::Break,
            "next" => NodeKind::Next,
            "return" => NodeKind::Return,
            "and" => NodeKind::And,
            "or" => NodeKind::Or,
            "not" => NodeKind::Not,
            "negate" => NodeKind::Negate,
            "def" => NodeKind::Def,
            "class" => NodeKind::Class,
            "module" => NodeKind::Module,
            "sym" => NodeKind::Sym,
            "hash" => NodeKind::Hash,
            "dstr" => NodeKind::Dstr,
            "xstr" => NodeKind::Xstr,
            "regx" => NodeKind::Regx,
            "yield" => NodeKind::Yield,
            "super" => NodeKind::Super,
            "zsuper" => NodeKind::Zsuper,
            "case" => NodeKind::Case,
            "rescue" => NodeKind::Rescue,
            "ensure" => NodeKind::Ensure,
            "for" => NodeKind::For,
            "splat" => NodeKind::Splat,
            "redo" => NodeKind::Redo,
            "retry" => NodeKind::Retry,
            "lambda" => NodeKind::Lambda,
            "sdef" => NodeKind::Sdef,
            "sclass" => NodeKind::Sclass,
            "alias" => NodeKind::Alias,
            "undef" => NodeKind::Undef,
            "dot2" => NodeKind::Dot2,
            "dot3" => NodeKind::Dot3,
            "colon2" => NodeKind::Colon2,
            "colon3" => NodeKind::Colon3,
            "masgn" => NodeKind::Masgn,
            "block_pass" => NodeKind::BlockPass,
            "nth_ref" => NodeKind::NthRef,
            "back_ref" => NodeKind::BackRef,
            "postexe" => NodeKind::Postexe,
            _ => return None,
        })
    }

    /// Tag name used in the textual form
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Scope => "scope",
            NodeKind::Begin => "begin",
            NodeKind::Call => "call",
            NodeKind::Fcall => "fcall",
            NodeKind::Block => "block",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
            NodeKind::Str => "str",
            NodeKind::Nil => "nil",
            NodeKind::True => "true",
            NodeKind::False => "false",
            NodeKind::SelfRef => "self",
            NodeKind::Array => "array",
            NodeKind::Lvar => "lvar",
            NodeKind::Ivar => "ivar",
            NodeKind::Gvar => "gvar",
            NodeKind::Cvar => "cvar",
            NodeKind::Const => "const",
            NodeKind::Asgn => "asgn",
            NodeKind::OpAsgn => "op_asgn",
            NodeKind::If => "if",
            NodeKind::Unless => "unless",
            NodeKind::While => "while",
            NodeKind::Until => "until",
            NodeKind::Break => "break",
            NodeKind::Next => "next",
            NodeKind::Return => "return",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Not => "not",
            NodeKind::Negate => "negate",
            NodeKind::Def => "def",
            NodeKind::Class => "class",
            NodeKind::Module => "module",
            NodeKind::Sym => "sym",
            NodeKind::Hash => "hash",
            NodeKind::Dstr => "dstr",
            NodeKind::Xstr => "xstr",
            NodeKind::Regx => "regx",
            NodeKind::Yield => "yield",
            NodeKind::Super => "super",
            NodeKind::Zsuper => "zsuper",
            NodeKind::Case => "case",
            NodeKind::Rescue => "rescue",
            NodeKind::Ensure => "ensure",
            NodeKind::For => "for",
            NodeKind::Splat => "splat",
            NodeKind::Redo => "redo",
            NodeKind::Retry => "retry",
            NodeKind::Lambda => "lambda",
            NodeKind::Sdef => "sdef",
            NodeKind::Sclass => "sclass",
            NodeKind::Alias => "alias",
            NodeKind::Undef => "undef",
            NodeKind::Dot2 => "dot2",
            NodeKind::Dot3 => "dot3",
            NodeKind::Colon2 => "colon2",
            NodeKind::Colon3 => "colon3",
            NodeKind::Masgn => "masgn",
            NodeKind::BlockPass => "block_pass",
            NodeKind::NthRef => "nth_ref",
            NodeKind::BackRef => "back_ref",
            NodeKind::Postexe => "postexe",
        }
    }
}
