//! Conversion of grounding events into meta-facts.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use metalp_core::{AtomId, Lit};
use metalp_ground::{CompoundKind, GroundEvent};
use tracing::debug;

use crate::error::{ReifyError, ReifyResult};
use crate::fact::{MetaFact, RuleBody, RuleHead, SequenceType};
use crate::log::MetaLog;

/// Consumes grounding events and appends their meta-facts to a log.
///
/// Every event yields exactly one primary fact. Tuples are content-addressed:
/// the first reference emits the tuple's facts right before the referencing
/// fact, later references reuse its identifier.
#[derive(Debug, Default)]
pub struct Reifier {
    log: MetaLog,
    next_id: u32,
    atom_tuples: HashMap<Vec<u32>, u32>,
    literal_tuples: HashMap<Vec<i32>, u32>,
    weighted_tuples: HashMap<Vec<(i32, i64)>, u32>,
    theory_tuples: HashMap<Vec<u32>, u32>,
    element_tuples: HashMap<Vec<u32>, u32>,
    /// Grounder theory term ids to reified ids.
    terms: HashMap<u32, u32>,
    /// Grounder theory element ids to reified ids.
    elements: HashMap<u32, u32>,
}

impl Reifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain `events` until every sender is gone and return the log.
    pub fn consume(mut self, events: Receiver<GroundEvent>) -> ReifyResult<MetaLog> {
        for event in events {
            self.observe(event)?;
        }
        debug!(facts = self.log.len(), "reification finished");
        Ok(self.log)
    }

    pub fn finish(self) -> MetaLog {
        self.log
    }

    pub fn log(&self) -> &MetaLog {
        &self.log
    }

    /// Convert one event.
    pub fn observe(&mut self, event: GroundEvent) -> ReifyResult<()> {
        match event {
            GroundEvent::Rule { choice, head, body } => {
                let head = self.rule_head(choice, &head);
                let body = RuleBody::Normal(self.literal_tuple(&body));
                self.log.append(MetaFact::Rule { head, body });
            }
            GroundEvent::WeightRule {
                choice,
                head,
                lower,
                body,
            } => {
                let head = self.rule_head(choice, &head);
                let tuple = self.weighted_tuple(&body);
                let body = RuleBody::Sum { tuple, lower };
                self.log.append(MetaFact::Rule { head, body });
            }
            GroundEvent::Output { symbol, condition } => {
                let tuple = self.literal_tuple(&condition);
                self.log.append(MetaFact::Output { symbol, tuple });
            }
            GroundEvent::External { atom, value } => {
                self.log.append(MetaFact::External {
                    atom: atom.raw(),
                    value,
                });
            }
            GroundEvent::TheoryNumber { id, number } => {
                let term = self.define_term(id);
                self.log.append(MetaFact::TheoryNumber { term, number });
            }
            GroundEvent::TheoryString { id, name } => {
                let term = self.define_term(id);
                self.log.append(MetaFact::TheoryString { term, name });
            }
            GroundEvent::TheoryCompound { id, kind, args } => {
                let args = self.term_ids(&args)?;
                let args = self.theory_tuple(&args);
                let fact = match kind {
                    CompoundKind::Function(name) => {
                        let name = self.term_id(name)?;
                        let term = self.define_term(id);
                        MetaFact::TheoryFunction { term, name, args }
                    }
                    CompoundKind::Tuple => self.sequence(id, SequenceType::Tuple, args),
                    CompoundKind::List => self.sequence(id, SequenceType::List, args),
                    CompoundKind::Set => self.sequence(id, SequenceType::Set, args),
                };
                self.log.append(fact);
            }
            GroundEvent::TheoryElement {
                id,
                terms,
                condition,
            } => {
                let terms = self.term_ids(&terms)?;
                let terms = self.theory_tuple(&terms);
                let condition = self.literal_tuple(&condition);
                let element = self.fresh();
                self.elements.insert(id, element);
                self.log.append(MetaFact::TheoryElement {
                    element,
                    terms,
                    condition,
                });
            }
            GroundEvent::TheoryAtom {
                atom,
                term,
                elements,
                guard,
            } => {
                let term = self.term_id(term)?;
                let elements = elements
                    .iter()
                    .map(|e| {
                        self.elements
                            .get(e)
                            .copied()
                            .ok_or_else(|| ReifyError::unknown_element(*e))
                    })
                    .collect::<ReifyResult<Vec<_>>>()?;
                let elements = self.element_tuple(&elements);
                let atom = atom.raw();
                let fact = match guard {
                    Some((operator, guard)) => MetaFact::TheoryGuardedAtom {
                        atom,
                        term,
                        elements,
                        operator: self.term_id(operator)?,
                        guard: self.term_id(guard)?,
                    },
                    None => MetaFact::TheoryAtom {
                        atom,
                        term,
                        elements,
                    },
                };
                self.log.append(fact);
            }
        }
        Ok(())
    }

    fn fresh(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn define_term(&mut self, id: u32) -> u32 {
        let term = self.fresh();
        self.terms.insert(id, term);
        term
    }

    fn term_id(&self, id: u32) -> ReifyResult<u32> {
        self.terms
            .get(&id)
            .copied()
            .ok_or_else(|| ReifyError::unknown_term(id))
    }

    fn term_ids(&self, ids: &[u32]) -> ReifyResult<Vec<u32>> {
        ids.iter().map(|id| self.term_id(*id)).collect()
    }

    fn sequence(&mut self, id: u32, kind: SequenceType, args: u32) -> MetaFact {
        let term = self.define_term(id);
        MetaFact::TheorySequence { term, kind, args }
    }

    fn rule_head(&mut self, choice: bool, head: &[AtomId]) -> RuleHead {
        let tuple = self.atom_tuple(head);
        if choice {
            RuleHead::Choice(tuple)
        } else {
            RuleHead::Disjunction(tuple)
        }
    }

    // ==================== TUPLES ====================

    fn atom_tuple(&mut self, atoms: &[AtomId]) -> u32 {
        let mut key: Vec<u32> = atoms.iter().map(AtomId::raw).collect();
        key.sort_unstable();
        key.dedup();
        if let Some(id) = self.atom_tuples.get(&key) {
            return *id;
        }
        let tuple = self.fresh();
        self.log.append(MetaFact::AtomTuple(tuple));
        for atom in &key {
            self.log.append(MetaFact::AtomTupleAtom { tuple, atom: *atom });
        }
        self.atom_tuples.insert(key, tuple);
        tuple
    }

    fn literal_tuple(&mut self, literals: &[Lit]) -> u32 {
        let mut key: Vec<i32> = literals.iter().map(Lit::raw).collect();
        key.sort_unstable();
        key.dedup();
        if let Some(id) = self.literal_tuples.get(&key) {
            return *id;
        }
        let tuple = self.fresh();
        self.log.append(MetaFact::LiteralTuple(tuple));
        for literal in &key {
            self.log.append(MetaFact::LiteralTupleLiteral {
                tuple,
                literal: *literal,
            });
        }
        self.literal_tuples.insert(key, tuple);
        tuple
    }

    fn weighted_tuple(&mut self, literals: &[(Lit, i64)]) -> u32 {
        let key: Vec<(i32, i64)> = literals.iter().map(|(l, w)| (l.raw(), *w)).collect();
        if let Some(id) = self.weighted_tuples.get(&key) {
            return *id;
        }
        let tuple = self.fresh();
        self.log.append(MetaFact::WeightedLiteralTuple(tuple));
        for (literal, weight) in &key {
            self.log.append(MetaFact::WeightedLiteralTupleLiteral {
                tuple,
                literal: *literal,
                weight: *weight,
            });
        }
        self.weighted_tuples.insert(key, tuple);
        tuple
    }

    /// Positional tuple of reified term ids.
    fn theory_tuple(&mut self, terms: &[u32]) -> u32 {
        if let Some(id) = self.theory_tuples.get(terms) {
            return *id;
        }
        let tuple = self.fresh();
        self.log.append(MetaFact::TheoryTuple(tuple));
        for (position, term) in terms.iter().enumerate() {
            self.log.append(MetaFact::TheoryTupleTerm {
                tuple,
                position,
                term: *term,
            });
        }
        self.theory_tuples.insert(terms.to_vec(), tuple);
        tuple
    }

    fn element_tuple(&mut self, elements: &[u32]) -> u32 {
        let mut key = elements.to_vec();
        key.sort_unstable();
        key.dedup();
        if let Some(id) = self.element_tuples.get(&key) {
            return *id;
        }
        let tuple = self.fresh();
        self.log.append(MetaFact::TheoryElementTuple(tuple));
        for element in &key {
            self.log.append(MetaFact::TheoryElementTupleElement {
                tuple,
                element: *element,
            });
        }
        self.element_tuples.insert(key, tuple);
        tuple
    }
}
