//! Structural events emitted while grounding.
//!
//! Events arrive in a fixed order: the theory terms, elements and atom a rule
//! refers to precede the rule itself; externals follow all rules and outputs
//! come last. Theory term identifiers are local to one grounding run.

use metalp_core::{AtomId, Lit, Symbol};
use std::sync::mpsc::Sender;

/// One structural fact about the ground program.
#[derive(Debug, Clone, PartialEq)]
pub enum GroundEvent {
    /// `head :- body`; with `choice` the head atoms are freely chosen.
    Rule {
        choice: bool,
        head: Vec<AtomId>,
        body: Vec<Lit>,
    },
    /// `head :- lower <= #sum { w,l : l }`.
    WeightRule {
        choice: bool,
        head: Vec<AtomId>,
        lower: i64,
        body: Vec<(Lit, i64)>,
    },
    /// `symbol` is shown when `condition` holds.
    Output { symbol: Symbol, condition: Vec<Lit> },
    External { atom: AtomId, value: TruthValue },
    TheoryNumber { id: u32, number: i64 },
    /// Constants, strings and operator names.
    TheoryString { id: u32, name: String },
    TheoryCompound {
        id: u32,
        kind: CompoundKind,
        args: Vec<u32>,
    },
    TheoryElement {
        id: u32,
        terms: Vec<u32>,
        condition: Vec<Lit>,
    },
    TheoryAtom {
        atom: AtomId,
        term: u32,
        elements: Vec<u32>,
        guard: Option<(u32, u32)>,
    },
}

/// Shape of a compound theory term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundKind {
    /// Function whose name is the given theory term.
    Function(u32),
    Tuple,
    List,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruthValue {
    True,
    False,
    Free,
    Release,
}

impl TruthValue {
    pub fn name(&self) -> &'static str {
        match self {
            TruthValue::True => "true",
            TruthValue::False => "false",
            TruthValue::Free => "free",
            TruthValue::Release => "release",
        }
    }
}

/// Producer side of the event channel.
pub type EventSender = Sender<GroundEvent>;
