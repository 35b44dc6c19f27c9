//! Syntax tree node structure

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ReadResult;
use crate::node_kind::NodeKind;

/// A node of the consumed syntax tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The kind of node
    pub kind: NodeKind,

    /// Source line (1-indexed) used for diagnostics
    #[serde(default)]
    pub line: u32,

    /// Ordered children; their meaning depends on `kind`
    #[serde(default)]
    pub children: Vec<Child>,
}

/// A child slot of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Child {
    Node(Node),
    /// Identifier or operator name (`foo`, `@x`, `[]=`)
    Sym(String),
    Str(String),
    Int(i64),
    List(Vec<Child>),
    /// An absent optional child
    Nil,
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Child::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Child::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Child::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Child]> {
        match self {
            Child::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Child::Nil)
    }
}

impl Node {
    /// Create a new node without children
    pub fn new(kind: NodeKind, line: u32) -> Self {
        Self {
            kind,
            line,
            children: Vec::new(),
        }
    }

    /// Create a new node with children
    pub fn with_children(kind: NodeKind, line: u32, children: Vec<Child>) -> Self {
        Self {
            kind,
            line,
            children,
        }
    }

    /// Add a child
    pub fn push(&mut self, child: Child) {
        self.children.push(child);
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    /// Child at `index` if it is a node; `nil` and missing children are `None`
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.child(index).and_then(Child::as_node)
    }

    pub fn sym(&self, index: usize) -> Option<&str> {
        self.child(index).and_then(Child::as_sym)
    }

    pub fn str_at(&self, index: usize) -> Option<&str> {
        self.child(index).and_then(Child::as_str)
    }

    pub fn int_at(&self, index: usize) -> Option<i64> {
        self.child(index).and_then(Child::as_int)
    }

    pub fn list(&self, index: usize) -> Option<&[Child]> {
        self.child(index).and_then(Child::as_list)
    }

    /// Symbols of a list child, skipping non-symbol entries
    pub fn sym_list(&self, index: usize) -> Option<Vec<&str>> {
        self.list(index)
            .map(|items| items.iter().filter_map(Child::as_sym).collect())
    }

    /// Node children from `start` on
    pub fn nodes_from(&self, start: usize) -> impl Iterator<Item = &Node> {
        self.children.iter().skip(start).filter_map(Child::as_node)
    }

    /// Load a tree from its JSON form
    pub fn from_json(json: &str) -> ReadResult<Node> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub(crate) fn escape_str(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\x1b' => out.push_str("\\e"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_child(child: &Child, out: &mut String) {
    match child {
        Child::Node(node) => write_node(node, out),
        Child::Sym(s) => {
            if s.starts_with(|c: char| c.is_ascii_alphabetic() || matches!(c, '_' | '@' | '$')) {
                out.push_str(s);
            } else {
                out.push(':');
                out.push_str(s);
            }
        }
        Child::Str(s) => escape_str(s, out),
        Child::Int(v) => out.push_str(&v.to_string()),
        Child::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_child(item, out);
            }
            out.push(']');
        }
        Child::Nil => out.push_str("nil"),
    }
}

fn write_node(node: &Node, out: &mut String) {
    out.push('(');
    out.push_str(node.kind.as_str());
    if node.line > 0 {
        out.push_str(&format!(" #{}", node.line));
    }
    for child in &node.children {
        out.push(' ');
        write_child(child, out);
    }
    out.push(')');
}

/// Prints the textual form accepted by [`crate::read`]
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_node(self, &mut out);
        f.write_str(&out)
    }
}
