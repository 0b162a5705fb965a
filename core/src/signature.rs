//! Predicate signatures.

use std::fmt;

/// Name, arity and classical sign of a predicate, as in `-p/2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    pub name: String,
    pub arity: usize,
    pub positive: bool,
}

impl Signature {
    pub fn new(name: impl Into<String>, arity: usize, positive: bool) -> Self {
        Self {
            name: name.into(),
            arity,
            positive,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.positive {
            write!(f, "-")?;
        }
        write!(f, "{}/{}", self.name, self.arity)
    }
}
