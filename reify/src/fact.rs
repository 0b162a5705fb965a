//! The meta-fact vocabulary.

use std::fmt;

use metalp_core::Symbol;
use metalp_ground::TruthValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleHead {
    /// `disjunction(T)`; an empty tuple for integrity constraints.
    Disjunction(u32),
    /// `choice(T)`
    Choice(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleBody {
    /// `normal(T)` over a literal tuple.
    Normal(u32),
    /// `sum(T,G)` over a weighted literal tuple with lower bound `G`.
    Sum { tuple: u32, lower: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceType {
    Tuple,
    List,
    Set,
}

impl SequenceType {
    pub fn name(&self) -> &'static str {
        match self {
            SequenceType::Tuple => "tuple",
            SequenceType::List => "list",
            SequenceType::Set => "set",
        }
    }
}

/// One record of the reified program.
///
/// Tuple, theory term and theory element identifiers share one numbering;
/// atom identifiers are the grounder's.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaFact {
    AtomTuple(u32),
    AtomTupleAtom { tuple: u32, atom: u32 },
    LiteralTuple(u32),
    LiteralTupleLiteral { tuple: u32, literal: i32 },
    WeightedLiteralTuple(u32),
    WeightedLiteralTupleLiteral { tuple: u32, literal: i32, weight: i64 },
    Rule { head: RuleHead, body: RuleBody },
    Output { symbol: Symbol, tuple: u32 },
    External { atom: u32, value: TruthValue },
    TheoryNumber { term: u32, number: i64 },
    TheoryString { term: u32, name: String },
    TheoryFunction { term: u32, name: u32, args: u32 },
    TheorySequence { term: u32, kind: SequenceType, args: u32 },
    TheoryTuple(u32),
    TheoryTupleTerm { tuple: u32, position: usize, term: u32 },
    TheoryElement { element: u32, terms: u32, condition: u32 },
    TheoryElementTuple(u32),
    TheoryElementTupleElement { tuple: u32, element: u32 },
    TheoryAtom { atom: u32, term: u32, elements: u32 },
    TheoryGuardedAtom { atom: u32, term: u32, elements: u32, operator: u32, guard: u32 },
    /// Ground symbol of a theory term, added after reification.
    TheorySymbol { id: u32, symbol: Symbol },
}

fn num(n: impl Into<i64>) -> Symbol {
    Symbol::number(n.into())
}

impl MetaFact {
    /// The fact as a ground atom.
    pub fn to_symbol(&self) -> Symbol {
        let (name, args) = match self {
            MetaFact::AtomTuple(t) => ("atom_tuple", vec![num(*t)]),
            MetaFact::AtomTupleAtom { tuple, atom } => ("atom_tuple", vec![num(*tuple), num(*atom)]),
            MetaFact::LiteralTuple(t) => ("literal_tuple", vec![num(*t)]),
            MetaFact::LiteralTupleLiteral { tuple, literal } => {
                ("literal_tuple", vec![num(*tuple), num(*literal)])
            }
            MetaFact::WeightedLiteralTuple(t) => ("weighted_literal_tuple", vec![num(*t)]),
            MetaFact::WeightedLiteralTupleLiteral {
                tuple,
                literal,
                weight,
            } => (
                "weighted_literal_tuple",
                vec![num(*tuple), num(*literal), num(*weight)],
            ),
            MetaFact::Rule { head, body } => {
                let head = match head {
                    RuleHead::Disjunction(t) => Symbol::function("disjunction", vec![num(*t)]),
                    RuleHead::Choice(t) => Symbol::function("choice", vec![num(*t)]),
                };
                let body = match body {
                    RuleBody::Normal(t) => Symbol::function("normal", vec![num(*t)]),
                    RuleBody::Sum { tuple, lower } => {
                        Symbol::function("sum", vec![num(*tuple), num(*lower)])
                    }
                };
                ("rule", vec![head, body])
            }
            MetaFact::Output { symbol, tuple } => ("output", vec![symbol.clone(), num(*tuple)]),
            MetaFact::External { atom, value } => {
                ("external", vec![num(*atom), Symbol::constant(value.name())])
            }
            MetaFact::TheoryNumber { term, number } => {
                ("theory_number", vec![num(*term), num(*number)])
            }
            MetaFact::TheoryString { term, name } => {
                ("theory_string", vec![num(*term), Symbol::string(name.clone())])
            }
            MetaFact::TheoryFunction { term, name, args } => {
                ("theory_function", vec![num(*term), num(*name), num(*args)])
            }
            MetaFact::TheorySequence { term, kind, args } => (
                "theory_sequence",
                vec![num(*term), Symbol::constant(kind.name()), num(*args)],
            ),
            MetaFact::TheoryTuple(t) => ("theory_tuple", vec![num(*t)]),
            MetaFact::TheoryTupleTerm {
                tuple,
                position,
                term,
            } => (
                "theory_tuple",
                vec![num(*tuple), Symbol::number(*position as i64), num(*term)],
            ),
            MetaFact::TheoryElement {
                element,
                terms,
                condition,
            } => (
                "theory_element",
                vec![num(*element), num(*terms), num(*condition)],
            ),
            MetaFact::TheoryElementTuple(t) => ("theory_element_tuple", vec![num(*t)]),
            MetaFact::TheoryElementTupleElement { tuple, element } => {
                ("theory_element_tuple", vec![num(*tuple), num(*element)])
            }
            MetaFact::TheoryAtom {
                atom,
                term,
                elements,
            } => ("theory_atom", vec![num(*atom), num(*term), num(*elements)]),
            MetaFact::TheoryGuardedAtom {
                atom,
                term,
                elements,
                operator,
                guard,
            } => (
                "theory_atom",
                vec![
                    num(*atom),
                    num(*term),
                    num(*elements),
                    num(*operator),
                    num(*guard),
                ],
            ),
            MetaFact::TheorySymbol { id, symbol } => {
                ("theory_symbol", vec![num(*id), symbol.clone()])
            }
        };
        Symbol::function(name, args)
    }

    /// Largest surrogate identifier the fact defines or references.
    ///
    /// Literals count by their atom, weights and numbers not at all.
    pub fn max_id(&self) -> u32 {
        match self {
            MetaFact::AtomTuple(t)
            | MetaFact::LiteralTuple(t)
            | MetaFact::WeightedLiteralTuple(t)
            | MetaFact::TheoryTuple(t)
            | MetaFact::TheoryElementTuple(t) => *t,
            MetaFact::AtomTupleAtom { tuple, atom } => (*tuple).max(*atom),
            MetaFact::LiteralTupleLiteral { tuple, literal }
            | MetaFact::WeightedLiteralTupleLiteral { tuple, literal, .. } => {
                (*tuple).max(literal.unsigned_abs())
            }
            MetaFact::Rule { head, body } => {
                let head = match head {
                    RuleHead::Disjunction(t) | RuleHead::Choice(t) => *t,
                };
                let body = match body {
                    RuleBody::Normal(t) | RuleBody::Sum { tuple: t, .. } => *t,
                };
                head.max(body)
            }
            MetaFact::Output { tuple, .. } => *tuple,
            MetaFact::External { atom, .. } => *atom,
            MetaFact::TheoryNumber { term, .. } | MetaFact::TheoryString { term, .. } => *term,
            MetaFact::TheoryFunction { term, name, args } => (*term).max(*name).max(*args),
            MetaFact::TheorySequence { term, args, .. } => (*term).max(*args),
            MetaFact::TheoryTupleTerm { tuple, term, .. } => (*tuple).max(*term),
            MetaFact::TheoryElement {
                element,
                terms,
                condition,
            } => (*element).max(*terms).max(*condition),
            MetaFact::TheoryElementTupleElement { tuple, element } => (*tuple).max(*element),
            MetaFact::TheoryAtom {
                atom,
                term,
                elements,
            } => (*atom).max(*term).max(*elements),
            MetaFact::TheoryGuardedAtom {
                atom,
                term,
                elements,
                operator,
                guard,
            } => (*atom).max(*term).max(*elements).max(*operator).max(*guard),
            MetaFact::TheorySymbol { id, .. } => *id,
        }
    }
}

impl fmt::Display for MetaFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_symbol())
    }
}
