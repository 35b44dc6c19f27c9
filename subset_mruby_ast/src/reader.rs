//! Reader for the textual tree form
//!
//! ```text
//! node  := '(' kind line? child* ')'
//! line  := '#' digits
//! child := node | '[' child* ']' | string | integer | nil | name
//! ```
//!
//! A node without a line marker inherits the line of its parent; a root
//! node without one takes the line its opening parenthesis is on.

use crate::error::{ReadError, ReadResult};
use crate::lexer::{Lexer, SpannedToken, Token};
use crate::node::{Child, Node};
use crate::node_kind::NodeKind;

/// Read exactly one tree from `source`
pub fn read(source: &str) -> ReadResult<Node> {
    let mut reader = Reader::new(source);
    let node = reader.read_node()?;
    reader.expect_end()?;
    Ok(node)
}

/// Read every top-level tree in `source`
pub fn read_all(source: &str) -> ReadResult<Vec<Node>> {
    let mut reader = Reader::new(source);
    let mut nodes = Vec::new();
    while !reader.at_end()? {
        nodes.push(reader.read_node()?);
    }
    Ok(nodes)
}

/// Recursive-descent tree reader
#[derive(Debug)]
pub struct Reader<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    fn at_end(&mut self) -> ReadResult<bool> {
        match self.lexer.peek() {
            None => Ok(true),
            Some(Ok(_)) => Ok(false),
            Some(Err(e)) => Err(e.clone()),
        }
    }

    fn expect_end(&mut self) -> ReadResult<()> {
        match self.lexer.next_token() {
            None => Ok(()),
            Some(tok) => {
                let tok = tok?;
                Err(unexpected(&tok, "end of input"))
            }
        }
    }

    fn next(&mut self, expected: &str) -> ReadResult<SpannedToken<'a>> {
        match self.lexer.next_token() {
            Some(tok) => tok,
            None => Err(ReadError::UnexpectedEof {
                expected: expected.to_string(),
                line: self.lexer.last_line(),
            }),
        }
    }

    /// Read one top-level node
    pub fn read_node(&mut self) -> ReadResult<Node> {
        let open = self.next("'('")?;
        if open.token != Token::LParen {
            return Err(unexpected(&open, "'('"));
        }
        let line = open.span.line as u32;
        self.read_node_body(line)
    }

    /// Read the rest of a node after its opening parenthesis
    fn read_node_body(&mut self, inherited_line: u32) -> ReadResult<Node> {
        let tag = self.next("node kind")?;
        let kind = match tag.token {
            Token::Ident | Token::Nil => {
                NodeKind::from_name(tag.text).ok_or_else(|| ReadError::UnknownKind {
                    kind: tag.text.to_string(),
                    line: tag.span.line,
                })?
            }
            _ => return Err(unexpected(&tag, "node kind")),
        };

        let mut line = inherited_line;
        let has_mark = matches!(self.lexer.peek(), Some(Ok(tok)) if tok.token == Token::LineMark);
        if has_mark {
            let mark = self.next("line marker")?;
            line = parse_line_mark(&mark)?;
        }

        let mut node = Node::new(kind, line);
        loop {
            let tok = self.next("')'")?;
            if tok.token == Token::RParen {
                return Ok(node);
            }
            let child = self.read_child(tok, line)?;
            node.push(child);
        }
    }

    fn read_child(&mut self, tok: SpannedToken<'a>, line: u32) -> ReadResult<Child> {
        match tok.token {
            Token::LParen => Ok(Child::Node(self.read_node_body(line)?)),
            Token::LBracket => {
                let mut items = Vec::new();
                loop {
                    let item = self.next("']'")?;
                    if item.token == Token::RBracket {
                        return Ok(Child::List(items));
                    }
                    items.push(self.read_child(item, line)?);
                }
            }
            Token::Str => Ok(Child::Str(unescape(&tok)?)),
            Token::Int => tok
                .text
                .parse::<i64>()
                .map(Child::Int)
                .map_err(|_| ReadError::InvalidNumber {
                    literal: tok.text.to_string(),
                    line: tok.span.line,
                }),
            Token::Nil => Ok(Child::Nil),
            Token::Ident => Ok(Child::Sym(tok.text.to_string())),
            Token::Symbol => Ok(Child::Sym(
                tok.text.strip_prefix(':').unwrap_or(tok.text).to_string(),
            )),
            Token::RParen | Token::RBracket | Token::LineMark => Err(unexpected(&tok, "child")),
        }
    }
}

fn unexpected(tok: &SpannedToken<'_>, expected: &str) -> ReadError {
    ReadError::UnexpectedToken {
        found: tok.text.to_string(),
        expected: expected.to_string(),
        line: tok.span.line,
    }
}

fn parse_line_mark(tok: &SpannedToken<'_>) -> ReadResult<u32> {
    tok.text[1..]
        .parse::<u32>()
        .map_err(|_| ReadError::InvalidNumber {
            literal: tok.text.to_string(),
            line: tok.span.line,
        })
}

fn unescape(tok: &SpannedToken<'_>) -> ReadResult<String> {
    let body = &tok.text[1..tok.text.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('e') => out.push('\x1b'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            other => {
                return Err(ReadError::InvalidEscape {
                    sequence: format!("\\{}", other.map(String::from).unwrap_or_default()),
                    line: tok.span.line,
                })
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_literal() {
        let node = read("(int #4 \"42\" 10)").unwrap();
        assert_eq!(node.kind, NodeKind::Int);
        assert_eq!(node.line, 4);
        assert_eq!(node.str_at(0), Some("42"));
        assert_eq!(node.int_at(1), Some(10));
    }

    #[test]
    fn test_line_inheritance() {
        let node = read("(begin #2\n  (lvar x)\n  (lvar #9 y))").unwrap();
        assert_eq!(node.node(0).unwrap().line, 2);
        assert_eq!(node.node(1).unwrap().line, 9);

        let unmarked = read("\n\n(begin (nil))").unwrap();
        assert_eq!(unmarked.line, 3);
        assert_eq!(unmarked.node(0).unwrap().line, 3);
    }

    #[test]
    fn test_lists_and_symbols() {
        let node = read("(call (lvar a) :[]= [(int \"1\" 10) nil])").unwrap();
        assert_eq!(node.sym(1), Some("[]="));
        let args = node.list(2).unwrap();
        assert_eq!(args.len(), 2);
        assert!(args[1].is_nil());
    }

    #[test]
    fn test_string_escapes() {
        let node = read(r#"(str "a\tb\"c\\")"#).unwrap();
        assert_eq!(node.str_at(0), Some("a\tb\"c\\"));

        let err = read(r#"(str "\q")"#).unwrap_err();
        assert!(matches!(err, ReadError::InvalidEscape { .. }));
    }

    #[test]
    fn test_display_roundtrip() {
        let source = "(scope #1 [x] (asgn #2 (lvar #2 x) (str #2 \"hi\\n\")))";
        let node = read(source).unwrap();
        assert_eq!(node.to_string(), source);
        assert_eq!(read(&node.to_string()).unwrap(), node);
    }

    #[test]
    fn test_errors_carry_lines() {
        let err = read("(begin\n  (frob))").unwrap_err();
        assert_eq!(
            err,
            ReadError::UnknownKind {
                kind: "frob".to_string(),
                line: 2
            }
        );

        let err = read("(begin\n (nil)\n").unwrap_err();
        assert!(matches!(err, ReadError::UnexpectedEof { line: 3, .. }));

        let err = read("(nil) (nil)").unwrap_err();
        assert!(matches!(err, ReadError::UnexpectedToken { .. }));

        let err = read("(int \"1\" 99999999999999999999)").unwrap_err();
        assert!(matches!(err, ReadError::InvalidNumber { .. }));
    }

    #[test]
    fn test_read_all() {
        let nodes = read_all("(nil) ; comment\n(true)").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].kind, NodeKind::True);
        assert_eq!(nodes[1].line, 2);
    }
}
