//! Dispatch registry.
//!
//! Maps `(method name, argument count)` to the classes that declare a
//! compiled implementation, most recently declared first. The code generator
//! emits one multiplexer per key and one constructor dispatcher per arity
//! used with `.new`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::hir::Owner;

/// Registry key: method name and argument count.
pub type MethodKey = (String, usize);

/// Dispatch registry for one session.
#[derive(Debug, Default, Serialize)]
pub struct DispatchRegistry {
    entries: BTreeMap<MethodKey, Vec<Owner>>,
    constructor_arities: BTreeSet<usize>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a compiled declaration of `name/arity` by `owner`.
    ///
    /// The owner is prepended unless it already declared this key, in which
    /// case the later body replaces the earlier one and the order is kept.
    pub fn declare(&mut self, owner: Owner, name: &str, arity: usize) {
        let owners = self.entries.entry((name.to_string(), arity)).or_default();
        if !owners.contains(&owner) {
            debug!(
                method = name,
                arity,
                owner = owner.as_deref().unwrap_or("<top>"),
                "declared method"
            );
            owners.insert(0, owner);
        }
    }

    /// Record a dispatched call site so the key gets a multiplexer.
    pub fn note_call(&mut self, name: &str, argc: usize) {
        self.entries.entry((name.to_string(), argc)).or_default();
    }

    /// Record a `.new` call with `argc` arguments.
    pub fn note_constructor(&mut self, argc: usize) {
        self.constructor_arities.insert(argc);
    }

    /// Declaring owners of a key, most recent first.
    pub fn owners(&self, name: &str, arity: usize) -> &[Owner] {
        self.entries
            .get(&(name.to_string(), arity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All keys with their owners, sorted by key.
    pub fn entries(&self) -> impl Iterator<Item = (&MethodKey, &[Owner])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn constructor_arities(&self) -> impl Iterator<Item = usize> + '_ {
        self.constructor_arities.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
