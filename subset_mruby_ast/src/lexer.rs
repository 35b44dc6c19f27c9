//! Lexer for the textual tree form
//!
//! Wraps the logos-generated lexer with one token of lookahead and line
//! tracking.

use logos::Logos;

use crate::error::{ReadError, ReadResult};
use crate::span::{LineIndex, Span};

/// Tokens of the S-expression form
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r";[^\n]*")]
pub enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    /// `#12`: line marker for the enclosing node
    #[regex(r"#[0-9]+")]
    LineMark,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    #[regex(r"-?[0-9]+")]
    Int,

    #[token("nil")]
    Nil,

    /// Bare names: `foo`, `@x`, `@@y`, `$z`, `Foo`, `x=`, `empty?`
    #[regex(r"[A-Za-z_@$][A-Za-z0-9_@]*[?!=]?")]
    Ident,

    /// Operator names, optionally `:`-prefixed; bracket operators need the colon
    #[regex(r":[A-Za-z_@$][A-Za-z0-9_@]*[?!=]?")]
    #[regex(r":[-+*/<>=!%&|^~\[\]]+@?")]
    #[regex(r"[-+*/<>=!%&|^~]+@?")]
    Symbol,
}

impl Token {
    /// Human-readable description for diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::LineMark => "line marker",
            Token::Str => "string",
            Token::Int => "integer",
            Token::Nil => "nil",
            Token::Ident => "identifier",
            Token::Symbol => "symbol",
        }
    }
}

/// A token with its span
#[derive(Debug, Clone)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
}

/// Tree lexer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    lines: LineIndex,
    peeked: Option<Option<ReadResult<SpannedToken<'a>>>>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("offset", &self.inner.span().end)
            .field("lines", &self.lines.line_count())
            .finish()
    }
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            lines: LineIndex::new(source),
            peeked: None,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Line of the end of input, for end-of-file diagnostics
    pub fn last_line(&self) -> usize {
        self.lines.line_of(self.source.len())
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> Option<&ReadResult<SpannedToken<'a>>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_internal());
        }
        self.peeked.as_ref().and_then(|p| p.as_ref())
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Option<ReadResult<SpannedToken<'a>>> {
        if let Some(peeked) = self.peeked.take() {
            return peeked;
        }
        self.next_internal()
    }

    fn next_internal(&mut self) -> Option<ReadResult<SpannedToken<'a>>> {
        let result = self.inner.next()?;
        let range = self.inner.span();
        let span = self.lines.span(range.start, range.end);
        let text = self.inner.slice();
        Some(match result {
            Ok(token) => Ok(SpannedToken { token, span, text }),
            Err(()) => Err(ReadError::Unrecognized {
                text: text.to_string(),
                line: span.line,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<(Token, String)> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token() {
            let tok = tok.unwrap();
            out.push((tok.token, tok.text.to_string()));
        }
        out
    }

    #[test]
    fn test_basic_tokens() {
        let toks = tokens("(call #3 (lvar x) :[]= [-5 \"s\"] nil)");
        let kinds: Vec<Token> = toks.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::LParen,
                Token::Ident,
                Token::LineMark,
                Token::LParen,
                Token::Ident,
                Token::Ident,
                Token::RParen,
                Token::Symbol,
                Token::LBracket,
                Token::Int,
                Token::Str,
                Token::RBracket,
                Token::Nil,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_operator_symbols() {
        let toks = tokens("+ - -@ <= == ! :[] nil? x= @@count $g");
        let texts: Vec<&str> = toks.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(
            texts,
            vec!["+", "-", "-@", "<=", "==", "!", ":[]", "nil?", "x=", "@@count", "$g"]
        );
        assert_eq!(toks[7].0, Token::Ident);
    }

    #[test]
    fn test_comments_and_lines() {
        let mut lexer = Lexer::new("; header\n(nil)\n\n)");
        let first = lexer.next_token().unwrap().unwrap();
        assert_eq!(first.token, Token::LParen);
        assert_eq!(first.span.line, 2);
        let _ = lexer.next_token();
        let _ = lexer.next_token();
        let last = lexer.next_token().unwrap().unwrap();
        assert_eq!(last.span.line, 4);
        assert!(lexer.next_token().is_none());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("(int)");
        assert!(matches!(lexer.peek(), Some(Ok(t)) if t.token == Token::LParen));
        assert!(matches!(lexer.next_token(), Some(Ok(t)) if t.token == Token::LParen));
        assert!(matches!(lexer.next_token(), Some(Ok(t)) if t.token == Token::Ident));
    }

    #[test]
    fn test_unrecognized() {
        let mut lexer = Lexer::new("\n{");
        let err = lexer.next_token().unwrap().unwrap_err();
        assert_eq!(err.line(), 2);
    }
}
