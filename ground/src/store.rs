//! Interned ground atoms.

use std::collections::HashMap;

use metalp_core::{AtomId, Signature, Symbol};

/// Insertion-ordered set of atoms with a per-signature index.
///
/// Identifiers are dense and start at 1, in insertion order.
#[derive(Debug, Default)]
pub(crate) struct AtomStore {
    symbols: Vec<Symbol>,
    ids: HashMap<Symbol, AtomId>,
    by_signature: HashMap<Signature, Vec<AtomId>>,
}

impl AtomStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Intern `symbol`; the flag tells whether it was new.
    pub(crate) fn insert(&mut self, symbol: Symbol) -> (AtomId, bool) {
        if let Some(id) = self.ids.get(&symbol) {
            return (*id, false);
        }
        let id = AtomId::new(self.symbols.len() as u32 + 1);
        if let Some(signature) = symbol.signature() {
            self.by_signature.entry(signature).or_default().push(id);
        }
        self.ids.insert(symbol.clone(), id);
        self.symbols.push(symbol);
        (id, true)
    }

    pub(crate) fn get(&self, symbol: &Symbol) -> Option<AtomId> {
        self.ids.get(symbol).copied()
    }

    pub(crate) fn contains(&self, symbol: &Symbol) -> bool {
        self.ids.contains_key(symbol)
    }

    pub(crate) fn symbol(&self, id: AtomId) -> &Symbol {
        &self.symbols[id.raw() as usize - 1]
    }

    pub(crate) fn with_signature(&self, signature: &Signature) -> &[AtomId] {
        self.by_signature
            .get(signature)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn len(&self) -> usize {
        self.symbols.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (AtomId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (AtomId::new(i as u32 + 1), s))
    }

    pub(crate) fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }
}
