//! Identity types for ground program atoms.
//!
//! Atom identifiers are positive integers assigned by the grounder in
//! allocation order, starting at 1. A literal is a signed atom identifier.

use std::fmt;

/// Identifier of a program atom (symbolic, theory or auxiliary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

impl AtomId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A signed atom reference: positive for the atom, negative for its default negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(pub i32);

impl Lit {
    pub fn positive(atom: AtomId) -> Self {
        Self(atom.0 as i32)
    }

    pub fn negative(atom: AtomId) -> Self {
        Self(-(atom.0 as i32))
    }

    pub fn atom(&self) -> AtomId {
        AtomId(self.0.unsigned_abs())
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_sign() {
        let atom = AtomId::new(7);
        assert_eq!(Lit::positive(atom).raw(), 7);
        assert_eq!(Lit::negative(atom).raw(), -7);
        assert!(Lit::negative(atom).is_negative());
        assert_eq!(Lit::negative(atom).atom(), atom);
    }
}
