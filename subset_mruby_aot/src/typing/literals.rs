//! Literal typing.
//!
//! Integer literals that do not fit in 64 bits are promoted to floats, the
//! way the runtime itself widens integer overflow.

use std::num::IntErrorKind;

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use subset_mruby_ast::{Node, NodeKind};
use tracing::debug;

use super::{expect_node, Typer};
use crate::error::{CompileError, CompileResult};
use crate::hir::{Callee, HirId, HirKind, Literal, PrimOp};
use crate::lattice::{BuiltinClass, ConstValue, Lattice};
use crate::scope::Frame;

/// Parse integer literal text in `base`, promoting on overflow.
pub(crate) fn parse_int_literal(
    text: &str,
    base: u32,
    negative: bool,
) -> Result<(Literal, Lattice), String> {
    if !matches!(base, 2 | 8 | 10 | 16) {
        return Err(format!("unsupported base {}", base));
    }
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() {
        return Err("empty integer literal".to_string());
    }
    let signed = if negative {
        format!("-{}", digits)
    } else {
        digits
    };

    match i64::from_str_radix(&signed, base) {
        Ok(value) => Ok((
            Literal::Int {
                text: signed,
                base,
                value,
            },
            Lattice::int(value),
        )),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            let big = BigInt::parse_bytes(signed.as_bytes(), base)
                .ok_or_else(|| format!("invalid integer literal {:?}", text))?;
            let value = big.to_f64().unwrap_or(f64::INFINITY);
            let text = if value.is_infinite() {
                let sign = if value < 0.0 { "-" } else { "" };
                format!("({}1.0 / 0.0)", sign)
            } else if base == 10 {
                format!("{}.0", signed)
            } else {
                format!("{:?}", value)
            };
            debug!(literal = %signed, "integer literal promoted to float");
            Ok((Literal::Float { text, value }, Lattice::float(value)))
        }
        Err(_) => Err(format!("invalid integer literal {:?}", text)),
    }
}

/// Parse float literal text.
pub(crate) fn parse_float_literal(text: &str, negative: bool) -> Result<(Literal, Lattice), String> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let signed = if negative {
        format!("-{}", cleaned)
    } else {
        cleaned
    };
    let value: f64 = signed
        .parse()
        .map_err(|_| format!("invalid float literal {:?}", text))?;
    Ok((Literal::Float { text: signed, value }, Lattice::float(value)))
}

impl Typer<'_> {
    /// `(int "digits" base)`
    pub(super) fn type_int(&mut self, node: &Node, negative: bool) -> CompileResult<HirId> {
        let text = node
            .str_at(0)
            .ok_or_else(|| CompileError::malformed(node.kind, node.line, "expected digits"))?;
        let base = node.int_at(1).unwrap_or(10);
        let base = u32::try_from(base)
            .map_err(|_| CompileError::malformed(node.kind, node.line, "invalid base"))?;
        let (literal, lattice) = parse_int_literal(text, base, negative)
            .map_err(|detail| CompileError::malformed(node.kind, node.line, detail))?;
        Ok(self.alloc(HirKind::Literal(literal), lattice, node.line))
    }

    /// `(float "text")`
    pub(super) fn type_float(&mut self, node: &Node, negative: bool) -> CompileResult<HirId> {
        let text = node
            .str_at(0)
            .ok_or_else(|| CompileError::malformed(node.kind, node.line, "expected text"))?;
        let (literal, lattice) = parse_float_literal(text, negative)
            .map_err(|detail| CompileError::malformed(node.kind, node.line, detail))?;
        Ok(self.alloc(HirKind::Literal(literal), lattice, node.line))
    }

    /// `(str "text")`
    pub(super) fn type_str(&mut self, node: &Node) -> CompileResult<HirId> {
        let text = node
            .str_at(0)
            .ok_or_else(|| CompileError::malformed(node.kind, node.line, "expected text"))?;
        let literal = Literal::Str {
            text: text.to_string(),
            len: text.len(),
        };
        Ok(self.alloc(HirKind::Literal(literal), Lattice::string(text), node.line))
    }

    pub(super) fn literal_nil(&mut self, line: u32) -> HirId {
        self.alloc(HirKind::Literal(Literal::Nil), Lattice::nil(), line)
    }

    pub(super) fn literal_bool(&mut self, value: bool, line: u32) -> HirId {
        let (literal, constant) = if value {
            (Literal::True, ConstValue::True)
        } else {
            (Literal::False, ConstValue::False)
        };
        self.alloc(HirKind::Literal(literal), Lattice::Constant(constant), line)
    }

    pub(super) fn literal_int(&mut self, value: i64, line: u32) -> HirId {
        let literal = Literal::Int {
            text: value.to_string(),
            base: 10,
            value,
        };
        self.alloc(HirKind::Literal(literal), Lattice::int(value), line)
    }

    /// `(array elem*)`
    pub(super) fn type_array(&mut self, frame: &Frame<'_>, node: &Node) -> CompileResult<HirId> {
        let mut elems = Vec::new();
        for elem in node.nodes_from(0) {
            elems.push(self.type_node(frame, elem)?);
        }
        Ok(self.alloc(
            HirKind::Call {
                callee: Callee::Prim(PrimOp::AryNew),
                args: elems,
            },
            Lattice::set_of([BuiltinClass::Array]),
            node.line,
        ))
    }

    /// `(negate operand)`: folded into numeric literals, otherwise `-@`.
    pub(super) fn type_negate(&mut self, frame: &Frame<'_>, node: &Node) -> CompileResult<HirId> {
        let operand = expect_node(node, 0)?;
        match operand.kind {
            NodeKind::Int => self.type_int(operand, true),
            NodeKind::Float => self.type_float(operand, true),
            _ => self.type_send(frame, Some(operand), "-@", &[], node.line),
        }
    }
}
