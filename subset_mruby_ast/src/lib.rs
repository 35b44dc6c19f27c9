//! subset_mruby_ast
//!
//! The syntax tree consumed by the mruby subset compiler.
//!
//! Every node carries a kind tag, a source line and an ordered list of
//! children. Trees can be built directly, loaded from JSON, or read from a
//! compact S-expression form:
//!
//! ```
//! use subset_mruby_ast::{read, NodeKind};
//!
//! let node = read("(scope [x] (asgn #2 (lvar x) (int \"42\" 10)))").unwrap();
//! assert_eq!(node.kind, NodeKind::Scope);
//! assert_eq!(node.node(1).unwrap().line, 2);
//! ```

pub mod error;
pub mod lexer;
pub mod node;
pub mod node_kind;
pub mod reader;
pub mod span;

pub use error::{ReadError, ReadResult};
pub use lexer::{Lexer, SpannedToken, Token};
pub use node::{Child, Node};
pub use node_kind::NodeKind;
pub use reader::{read, read_all, Reader};
pub use span::{LineIndex, Span};
