//! Value lattice for abstract interpretation.
//!
//! Every expression the compiler types is approximated by a [`Lattice`]
//! value describing the runtime classes it may produce:
//!
//! ```text
//! Dynamic (any class, analysis gave up)
//!   ↑
//! Set{C1, C2, ...} (one of finitely many classes)
//!   ↑
//! Constant(v) (one known literal value)
//!   ↑
//! Unknown (no information yet)
//! ```
//!
//! # Module structure
//!
//! - `types`: class references, constant values and the lattice itself
//! - `ops`: join, inclusion and subsumption

pub mod ops;
pub mod types;

#[cfg(test)]
mod tests;

pub use types::{BuiltinClass, ClassRef, ClassSet, ConstValue, Lattice};
