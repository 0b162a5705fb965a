//! Instantiation and event emission.
//!
//! Grounding runs in two phases. The first computes the possibly true atoms
//! as a fixpoint that ignores default negation. The second walks the rules
//! in program order and emits one event per distinct ground rule, with
//! literals over impossible atoms simplified away.
//!
//! Body aggregates and conditional literals become auxiliary atoms. Bounds
//! on sums are weight rules; everything else is a normal rule over them.

use std::collections::{HashMap, HashSet};

use metalp_core::{AtomId, Lit, Symbol};
use metalp_parser::{
    Aggregate, AggregateFunction, Atom, Choice, ComparisonOp, ConditionalLiteral, Head, Literal,
    SequenceKind, Sign, Term, TheoryAtom,
};
use tracing::debug;

use crate::aggregate::{flip, guards_hold, weight};
use crate::error::{GroundError, GroundResult};
use crate::eval::{eval_atom, eval_single, eval_term, Bindings};
use crate::event::{CompoundKind, EventSender, GroundEvent};
use crate::plan::{Mode, Plan};
use crate::program::Program;
use crate::store::AtomStore;
use crate::theory::{ground_theory_term, TheoryValue};

type RuleKey = (bool, Vec<AtomId>, Vec<Lit>);
type TheoryAtomKey = (u32, Vec<u32>, Option<(u32, u32)>);

/// What an auxiliary atom stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum AuxKey {
    /// `lower <= #sum { w,l : l }`
    Sum(i64, Vec<(Lit, i64)>),
    Conjunction(Vec<Lit>),
    Disjunction(Vec<Vec<Lit>>),
    /// One instance `literal : condition` of a conditional literal.
    Conditional(Vec<Lit>, Vec<Lit>),
}

/// A ground aggregate part, simplified where possible.
enum Truth {
    True,
    False,
    Lit(Lit),
}

pub(crate) struct Grounder<'p> {
    program: &'p Program,
    sink: &'p EventSender,
    store: AtomStore,
    facts: HashSet<AtomId>,
    next_atom: u32,
    emitted: HashSet<RuleKey>,
    double_negations: HashMap<AtomId, AtomId>,
    terms: HashMap<TheoryValue, u32>,
    elements: HashMap<(Vec<u32>, Vec<Lit>), u32>,
    theory_atoms: HashMap<TheoryAtomKey, AtomId>,
    aux: HashMap<AuxKey, AtomId>,
}

impl<'p> Grounder<'p> {
    pub(crate) fn new(program: &'p Program, sink: &'p EventSender) -> Self {
        Self {
            program,
            sink,
            store: AtomStore::new(),
            facts: HashSet::new(),
            next_atom: 1,
            emitted: HashSet::new(),
            double_negations: HashMap::new(),
            terms: HashMap::new(),
            elements: HashMap::new(),
            theory_atoms: HashMap::new(),
            aux: HashMap::new(),
        }
    }

    pub(crate) fn run(mut self) -> GroundResult<()> {
        self.saturate()?;
        self.next_atom = self.store.len() as u32 + 1;
        debug!(atoms = self.store.len(), "possible atoms computed");

        let program = self.program;
        for rule in &program.rules {
            let solutions = rule.plan.solutions(&self.store, Mode::Possible, &Bindings::new());
            for bindings in solutions {
                self.emit_rule(&rule.rule.head, &rule.rule.body, &bindings, &rule.text)?;
            }
        }
        self.emit_complements()?;
        self.emit_externals()?;
        self.emit_outputs()?;

        debug!(
            rules = self.emitted.len(),
            atoms = self.next_atom - 1,
            "grounding finished"
        );
        Ok(())
    }

    // ==================== POSSIBLE ATOMS ====================

    fn saturate(&mut self) -> GroundResult<()> {
        let program = self.program;
        for rule in program.rules.iter().filter(|r| r.rule.body.is_empty()) {
            if let Head::Literal(literal) = &rule.rule.head {
                if let Atom::Symbolic(atom) = &literal.atom {
                    for symbol in eval_atom(atom, &Bindings::new()) {
                        self.store.insert(symbol);
                    }
                }
            }
        }

        loop {
            let mut changed = false;
            for rule in &program.rules {
                let solutions = rule.plan.solutions(&self.store, Mode::Possible, &Bindings::new());
                for bindings in solutions {
                    for symbol in self.head_symbols(&rule.rule.head, &bindings, &rule.text)? {
                        changed |= self.store.insert(symbol).1;
                    }
                }
            }
            for external in &program.externals {
                let solutions = external
                    .plan
                    .solutions(&self.store, Mode::Possible, &Bindings::new());
                for bindings in solutions {
                    for symbol in eval_atom(&external.atom, &bindings) {
                        changed |= self.store.insert(symbol).1;
                    }
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }

    fn head_symbols(
        &self,
        head: &Head,
        bindings: &Bindings,
        text: &str,
    ) -> GroundResult<Vec<Symbol>> {
        let mut out = Vec::new();
        match head {
            Head::Falsity => {}
            Head::Literal(literal) => out.extend(literal_symbols(literal, bindings)),
            Head::Disjunction(literals) => {
                for literal in literals {
                    out.extend(literal_symbols(literal, bindings));
                }
            }
            Head::Choice(choice) => {
                for element in &choice.elements {
                    let plan = element_plan(&element.condition, bindings, text)?;
                    for local in plan.solutions(&self.store, Mode::Possible, bindings) {
                        out.extend(literal_symbols(&element.literal, &local));
                    }
                }
            }
        }
        Ok(out)
    }

    // ==================== RULES ====================

    fn emit_rule(
        &mut self,
        head: &Head,
        body: &[Literal],
        bindings: &Bindings,
        text: &str,
    ) -> GroundResult<()> {
        let Some(body) = self.ground_literals(body, bindings, text)? else {
            return Ok(());
        };

        match head {
            Head::Falsity => self.rule(false, Vec::new(), body),
            Head::Literal(literal) => match &literal.atom {
                Atom::Theory(atom) => {
                    let id = self.theory_atom(atom, bindings, text)?;
                    self.rule(false, vec![id], body)
                }
                _ => {
                    for symbol in literal_symbols(literal, bindings) {
                        let Some(id) = self.store.get(&symbol) else {
                            continue;
                        };
                        if body.is_empty() {
                            self.facts.insert(id);
                        }
                        self.rule(false, vec![id], body.clone())?;
                    }
                    Ok(())
                }
            },
            Head::Disjunction(literals) => {
                let mut ids = Vec::new();
                for literal in literals {
                    for symbol in literal_symbols(literal, bindings) {
                        if let Some(id) = self.store.get(&symbol) {
                            push_unique(&mut ids, id);
                        }
                    }
                }
                self.rule(false, ids, body)
            }
            Head::Choice(choice) => self.emit_choice(choice, bindings, body, text),
        }
    }

    fn emit_choice(
        &mut self,
        choice: &Choice,
        bindings: &Bindings,
        body: Vec<Lit>,
        text: &str,
    ) -> GroundResult<()> {
        let mut plain = Vec::new();
        let mut conditional = Vec::new();
        for element in &choice.elements {
            let plan = element_plan(&element.condition, bindings, text)?;
            for local in plan.solutions(&self.store, Mode::Possible, bindings) {
                let Some(condition) = self.ground_literals(&element.condition, &local, text)? else {
                    continue;
                };
                for symbol in literal_symbols(&element.literal, &local) {
                    let Some(id) = self.store.get(&symbol) else {
                        continue;
                    };
                    if condition.is_empty() {
                        push_unique(&mut plain, id);
                    } else {
                        conditional.push((id, condition.clone()));
                    }
                }
            }
        }

        let mut all = plain.clone();
        for (id, _) in &conditional {
            push_unique(&mut all, *id);
        }

        if !plain.is_empty() {
            self.rule(true, plain, body.clone())?;
        }
        for (id, condition) in conditional {
            let mut extended = body.clone();
            extended.extend(condition);
            self.rule(true, vec![id], extended)?;
        }

        let weights: Vec<(Lit, i64)> = all.iter().map(|a| (Lit::positive(*a), 1)).collect();
        if let Some(lower) = bound(choice.lower.as_ref(), bindings) {
            if lower > 0 {
                let aux = self.fresh_atom();
                self.emit(GroundEvent::WeightRule {
                    choice: false,
                    head: vec![aux],
                    lower,
                    body: weights.clone(),
                })?;
                let mut constraint = body.clone();
                constraint.push(Lit::negative(aux));
                self.rule(false, Vec::new(), constraint)?;
            }
        }
        if let Some(upper) = bound(choice.upper.as_ref(), bindings) {
            if upper < all.len() as i64 {
                let aux = self.fresh_atom();
                self.emit(GroundEvent::WeightRule {
                    choice: false,
                    head: vec![aux],
                    lower: upper + 1,
                    body: weights,
                })?;
                let mut constraint = body;
                constraint.push(Lit::positive(aux));
                self.rule(false, Vec::new(), constraint)?;
            }
        }
        Ok(())
    }

    /// Ground literals of a body or condition; `None` when one is false.
    fn ground_literals(
        &mut self,
        literals: &[Literal],
        bindings: &Bindings,
        text: &str,
    ) -> GroundResult<Option<Vec<Lit>>> {
        let mut out = Vec::new();
        for literal in literals {
            match &literal.atom {
                Atom::Symbolic(atom) => {
                    let id = eval_atom(atom, bindings)
                        .first()
                        .and_then(|symbol| self.store.get(symbol));
                    match (literal.sign, id) {
                        (Sign::Positive, Some(id)) => push_unique(&mut out, Lit::positive(id)),
                        (Sign::Negative, Some(id)) => push_unique(&mut out, Lit::negative(id)),
                        (Sign::Negative, None) => {}
                        (Sign::DoubleNegative, Some(id)) => {
                            let aux = self.double_negation(id)?;
                            push_unique(&mut out, Lit::negative(aux));
                        }
                        (Sign::Positive | Sign::DoubleNegative, None) => return Ok(None),
                    }
                }
                Atom::Theory(atom) => {
                    let id = self.theory_atom(atom, bindings, text)?;
                    let lit = match literal.sign {
                        Sign::Negative => Lit::negative(id),
                        Sign::Positive | Sign::DoubleNegative => Lit::positive(id),
                    };
                    push_unique(&mut out, lit);
                }
                Atom::Aggregate(aggregate) => {
                    let Some(lits) = self.aggregate(aggregate, bindings, text)? else {
                        if literal.sign == Sign::Negative {
                            continue;
                        }
                        return Ok(None);
                    };
                    match literal.sign {
                        Sign::Positive => lits.into_iter().for_each(|l| push_unique(&mut out, l)),
                        Sign::Negative if lits.is_empty() => return Ok(None),
                        Sign::DoubleNegative if lits.is_empty() => {}
                        Sign::Negative => {
                            let lit = self.conjunction(lits)?;
                            push_unique(&mut out, complement(lit));
                        }
                        Sign::DoubleNegative => {
                            let lit = self.conjunction(lits)?;
                            let lit = if lit.is_negative() {
                                lit
                            } else {
                                Lit::negative(self.double_negation(lit.atom())?)
                            };
                            push_unique(&mut out, lit);
                        }
                    }
                }
                Atom::Conditional(conditional) => {
                    let Some(lits) = self.conditional(conditional, bindings, text)? else {
                        return Ok(None);
                    };
                    lits.into_iter().for_each(|l| push_unique(&mut out, l));
                }
                // Already decided during instantiation.
                Atom::Comparison(_) | Atom::Boolean(_) => {}
            }
        }
        Ok(Some(out))
    }

    // ==================== AGGREGATES ====================

    /// Literals whose conjunction is the aggregate; `None` when it cannot
    /// hold.
    fn aggregate(
        &mut self,
        aggregate: &Aggregate,
        bindings: &Bindings,
        text: &str,
    ) -> GroundResult<Option<Vec<Lit>>> {
        let elements = self.aggregate_elements(aggregate, bindings, text)?;
        match aggregate.function {
            AggregateFunction::Min | AggregateFunction::Max => {
                self.extremum(aggregate, &elements, bindings)
            }
            AggregateFunction::Count | AggregateFunction::Sum | AggregateFunction::SumPlus => {
                self.sum(aggregate, &elements, bindings)
            }
        }
    }

    /// Weight of every distinct tuple with the literal it counts under;
    /// `None` for tuples that always count.
    fn aggregate_elements(
        &mut self,
        aggregate: &Aggregate,
        bindings: &Bindings,
        text: &str,
    ) -> GroundResult<Vec<(Symbol, Option<Lit>)>> {
        let mut tuples: Vec<(Vec<Symbol>, Vec<Vec<Lit>>)> = Vec::new();
        for element in &aggregate.elements {
            let plan = element_plan(&element.condition, bindings, text)?;
            for local in plan.solutions(&self.store, Mode::Possible, bindings) {
                let Some(condition) = self.ground_literals(&element.condition, &local, text)? else {
                    continue;
                };
                let Some(tuple) = element
                    .terms
                    .iter()
                    .map(|t| eval_single(t, &local))
                    .collect::<Option<Vec<_>>>()
                else {
                    continue;
                };
                match tuples.iter_mut().find(|(t, _)| *t == tuple) {
                    Some((_, conditions)) => push_unique(conditions, condition),
                    None => tuples.push((tuple, vec![condition])),
                }
            }
        }

        let mut out = Vec::with_capacity(tuples.len());
        for (tuple, conditions) in tuples {
            let Some(weight) = weight(aggregate.function, &tuple) else {
                continue;
            };
            let lit = if conditions.iter().any(Vec::is_empty) {
                None
            } else {
                Some(self.disjunction(conditions)?)
            };
            out.push((weight, lit));
        }
        Ok(out)
    }

    fn sum(
        &mut self,
        aggregate: &Aggregate,
        elements: &[(Symbol, Option<Lit>)],
        bindings: &Bindings,
    ) -> GroundResult<Option<Vec<Lit>>> {
        let mut fixed = 0i64;
        let mut weighted = Vec::new();
        for (weight, lit) in elements {
            let Some(weight) = weight.as_number() else {
                continue;
            };
            match lit {
                None => fixed = fixed.saturating_add(weight),
                Some(lit) => weighted.push((*lit, weight)),
            }
        }

        let mut lower: Option<i64> = None;
        let mut upper: Option<i64> = None;
        let mut excluded = Vec::new();
        let guards = [
            aggregate.left.as_ref().map(|g| (flip(g.op), &g.term)),
            aggregate.right.as_ref().map(|g| (g.op, &g.term)),
        ];
        for (op, term) in guards.into_iter().flatten() {
            let Some(bound) = eval_single(term, bindings) else {
                return Ok(None);
            };
            let Some(bound) = bound.as_number() else {
                // Sums are numbers, which all compare alike against the rest.
                if op.holds(Symbol::number(0).cmp(&bound)) {
                    continue;
                }
                return Ok(None);
            };
            let raise = |current: Option<i64>, value: i64| Some(current.map_or(value, |c| c.max(value)));
            let cut = |current: Option<i64>, value: i64| Some(current.map_or(value, |c| c.min(value)));
            match op {
                ComparisonOp::Eq => {
                    lower = raise(lower, bound);
                    upper = cut(upper, bound);
                }
                ComparisonOp::NotEq => excluded.push(bound),
                ComparisonOp::Lt => upper = cut(upper, bound.saturating_sub(1)),
                ComparisonOp::LtEq => upper = cut(upper, bound),
                ComparisonOp::Gt => lower = raise(lower, bound.saturating_add(1)),
                ComparisonOp::GtEq => lower = raise(lower, bound),
            }
        }

        let Some(mut out) = self.sum_in_range(&weighted, fixed, lower, upper)? else {
            return Ok(None);
        };
        for value in excluded {
            match self.sum_in_range(&weighted, fixed, Some(value), Some(value))? {
                None => {}
                Some(lits) if lits.is_empty() => return Ok(None),
                Some(lits) => {
                    let lit = self.conjunction(lits)?;
                    push_unique(&mut out, complement(lit));
                }
            }
        }
        Ok(Some(out))
    }

    /// `lower <= fixed + sum <= upper` as a conjunction.
    fn sum_in_range(
        &mut self,
        weighted: &[(Lit, i64)],
        fixed: i64,
        lower: Option<i64>,
        upper: Option<i64>,
    ) -> GroundResult<Option<Vec<Lit>>> {
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                return Ok(None);
            }
        }
        let mut out = Vec::new();
        if let Some(lower) = lower {
            match self.at_least(weighted, lower.saturating_sub(fixed))? {
                Truth::True => {}
                Truth::False => return Ok(None),
                Truth::Lit(lit) => out.push(lit),
            }
        }
        if let Some(upper) = upper {
            let beyond = upper.saturating_add(1).saturating_sub(fixed);
            match self.at_least(weighted, beyond)? {
                Truth::True => return Ok(None),
                Truth::False => {}
                Truth::Lit(lit) => push_unique(&mut out, complement(lit)),
            }
        }
        Ok(Some(out))
    }

    /// `bound <= #sum { w,l : l }`, negative weights moved onto the
    /// complementary literal.
    fn at_least(&mut self, weighted: &[(Lit, i64)], bound: i64) -> GroundResult<Truth> {
        let mut lower = bound;
        let mut body: Vec<(Lit, i64)> = Vec::new();
        for &(lit, weight) in weighted {
            let (lit, weight) = match weight {
                0 => continue,
                w if w < 0 => {
                    lower = lower.saturating_sub(w);
                    (complement(lit), w.saturating_neg())
                }
                w => (lit, w),
            };
            match body.iter_mut().find(|(l, _)| *l == lit) {
                Some((_, total)) => *total = total.saturating_add(weight),
                None => body.push((lit, weight)),
            }
        }

        let total = body.iter().fold(0i64, |sum, (_, w)| sum.saturating_add(*w));
        if lower <= 0 {
            return Ok(Truth::True);
        }
        if lower > total {
            return Ok(Truth::False);
        }
        if let [(lit, _)] = body.as_slice() {
            return Ok(Truth::Lit(*lit));
        }

        let key = AuxKey::Sum(lower, body.clone());
        if let Some(aux) = self.aux.get(&key) {
            return Ok(Truth::Lit(Lit::positive(*aux)));
        }
        let aux = self.fresh_atom();
        self.aux.insert(key, aux);
        self.emit(GroundEvent::WeightRule {
            choice: false,
            head: vec![aux],
            lower,
            body,
        })?;
        Ok(Truth::Lit(Lit::positive(aux)))
    }

    /// `#min` and `#max`: one alternative per candidate value that
    /// satisfies the guards.
    fn extremum(
        &mut self,
        aggregate: &Aggregate,
        elements: &[(Symbol, Option<Lit>)],
        bindings: &Bindings,
    ) -> GroundResult<Option<Vec<Lit>>> {
        let min = aggregate.function == AggregateFunction::Min;
        let empty = if min { Symbol::Supremum } else { Symbol::Infimum };
        let mut candidates: Vec<Symbol> = elements.iter().map(|(w, _)| w.clone()).collect();
        candidates.push(empty.clone());
        candidates.sort();
        candidates.dedup();

        let mut alternatives = Vec::new();
        for value in candidates {
            if !guards_hold(aggregate, &value, bindings) {
                continue;
            }
            let beyond: Vec<Option<Lit>> = elements
                .iter()
                .filter(|(w, _)| if min { *w < value } else { *w > value })
                .map(|(_, l)| *l)
                .collect();
            let mut conjunction = Vec::new();
            match self.any(&beyond)? {
                Truth::True => continue,
                Truth::False => {}
                Truth::Lit(lit) => conjunction.push(complement(lit)),
            }
            if value != empty {
                let at: Vec<Option<Lit>> = elements
                    .iter()
                    .filter(|(w, _)| *w == value)
                    .map(|(_, l)| *l)
                    .collect();
                match self.any(&at)? {
                    Truth::True => {}
                    Truth::False => continue,
                    Truth::Lit(lit) => push_unique(&mut conjunction, lit),
                }
            }
            if conjunction.is_empty() {
                return Ok(Some(Vec::new()));
            }
            alternatives.push(conjunction);
        }

        match alternatives.len() {
            0 => Ok(None),
            1 => Ok(alternatives.pop()),
            _ => Ok(Some(vec![self.disjunction(alternatives)?])),
        }
    }

    /// Some of `lits` holds; `None` entries always hold.
    fn any(&mut self, lits: &[Option<Lit>]) -> GroundResult<Truth> {
        if lits.iter().any(Option::is_none) {
            return Ok(Truth::True);
        }
        let weighted: Vec<(Lit, i64)> = lits.iter().flatten().map(|l| (*l, 1)).collect();
        self.at_least(&weighted, 1)
    }

    /// A literal equivalent to `lits`, which must not be empty.
    fn conjunction(&mut self, lits: Vec<Lit>) -> GroundResult<Lit> {
        if let [lit] = lits.as_slice() {
            return Ok(*lit);
        }
        let key = AuxKey::Conjunction(lits.clone());
        if let Some(aux) = self.aux.get(&key) {
            return Ok(Lit::positive(*aux));
        }
        let aux = self.fresh_atom();
        self.aux.insert(key, aux);
        self.rule(false, vec![aux], lits)?;
        Ok(Lit::positive(aux))
    }

    /// A literal that holds when one of `conjunctions` does.
    fn disjunction(&mut self, conjunctions: Vec<Vec<Lit>>) -> GroundResult<Lit> {
        if let [conjunction] = conjunctions.as_slice() {
            if let [lit] = conjunction.as_slice() {
                return Ok(*lit);
            }
        }
        let key = AuxKey::Disjunction(conjunctions.clone());
        if let Some(aux) = self.aux.get(&key) {
            return Ok(Lit::positive(*aux));
        }
        let aux = self.fresh_atom();
        self.aux.insert(key, aux);
        for conjunction in conjunctions {
            self.rule(false, vec![aux], conjunction)?;
        }
        Ok(Lit::positive(aux))
    }

    /// One literal per instance of the condition, holding when the instance
    /// does not apply or its literal holds; `None` when an unconditional
    /// instance fails.
    fn conditional(
        &mut self,
        conditional: &ConditionalLiteral,
        bindings: &Bindings,
        text: &str,
    ) -> GroundResult<Option<Vec<Lit>>> {
        let plan = element_plan(&conditional.condition, bindings, text)?;
        let mut out = Vec::new();
        for local in plan.solutions(&self.store, Mode::Possible, bindings) {
            let Some(condition) = self.ground_literals(&conditional.condition, &local, text)? else {
                continue;
            };
            let head =
                self.ground_literals(std::slice::from_ref(&*conditional.literal), &local, text)?;
            if head.as_ref().is_some_and(Vec::is_empty) {
                continue;
            }
            if condition.is_empty() {
                match head {
                    Some(lits) => lits.into_iter().for_each(|l| push_unique(&mut out, l)),
                    None => return Ok(None),
                }
                continue;
            }

            let key = AuxKey::Conditional(head.clone().unwrap_or_default(), condition.clone());
            let aux = match self.aux.get(&key) {
                Some(aux) => *aux,
                None => {
                    let aux = self.fresh_atom();
                    self.aux.insert(key, aux);
                    if let Some(lits) = head {
                        self.rule(false, vec![aux], lits)?;
                    }
                    for lit in condition {
                        self.rule(false, vec![aux], vec![complement(lit)])?;
                    }
                    aux
                }
            };
            push_unique(&mut out, Lit::positive(aux));
        }
        Ok(Some(out))
    }

    /// Auxiliary atom standing for `not atom`.
    fn double_negation(&mut self, atom: AtomId) -> GroundResult<AtomId> {
        if let Some(aux) = self.double_negations.get(&atom) {
            return Ok(*aux);
        }
        let aux = self.fresh_atom();
        self.double_negations.insert(atom, aux);
        self.rule(false, vec![aux], vec![Lit::negative(atom)])?;
        Ok(aux)
    }

    fn rule(&mut self, choice: bool, head: Vec<AtomId>, body: Vec<Lit>) -> GroundResult<()> {
        if self
            .emitted
            .insert((choice, head.clone(), body.clone()))
        {
            self.emit(GroundEvent::Rule { choice, head, body })?;
        }
        Ok(())
    }

    // ==================== THEORY ====================

    fn theory_atom(
        &mut self,
        atom: &TheoryAtom,
        bindings: &Bindings,
        text: &str,
    ) -> GroundResult<AtomId> {
        let name = eval_single(&atom.name, bindings).ok_or_else(|| {
            GroundError::unsupported(format!("theory atom name does not evaluate in: {text}"))
        })?;
        let term = self.theory_term(&TheoryValue::from_symbol(&name))?;

        let mut elements = Vec::new();
        for element in &atom.elements {
            let plan = element_plan(&element.condition, bindings, text)?;
            for local in plan.solutions(&self.store, Mode::Possible, bindings) {
                let Some(condition) = self.ground_literals(&element.condition, &local, text)? else {
                    continue;
                };
                let Some(values) = element
                    .terms
                    .iter()
                    .map(|t| ground_theory_term(t, &local))
                    .collect::<Option<Vec<_>>>()
                else {
                    continue;
                };
                let mut terms = Vec::with_capacity(values.len());
                for value in &values {
                    terms.push(self.theory_term(value)?);
                }
                let id = self.theory_element(terms, condition)?;
                push_unique(&mut elements, id);
            }
        }

        let guard = match &atom.guard {
            Some(guard) => {
                let operator = self.theory_term(&TheoryValue::Name(guard.operator.clone()))?;
                let value = ground_theory_term(&guard.term, bindings).ok_or_else(|| {
                    GroundError::unsupported(format!("theory guard does not evaluate in: {text}"))
                })?;
                Some((operator, self.theory_term(&value)?))
            }
            None => None,
        };

        let key = (term, elements.clone(), guard);
        if let Some(id) = self.theory_atoms.get(&key) {
            return Ok(*id);
        }
        let id = self.fresh_atom();
        self.theory_atoms.insert(key, id);
        self.emit(GroundEvent::TheoryAtom {
            atom: id,
            term,
            elements,
            guard,
        })?;
        Ok(id)
    }

    fn theory_element(&mut self, terms: Vec<u32>, condition: Vec<Lit>) -> GroundResult<u32> {
        let key = (terms, condition);
        if let Some(id) = self.elements.get(&key) {
            return Ok(*id);
        }
        let id = self.elements.len() as u32;
        self.elements.insert(key.clone(), id);
        let (terms, condition) = key;
        self.emit(GroundEvent::TheoryElement {
            id,
            terms,
            condition,
        })?;
        Ok(id)
    }

    /// Intern a ground theory term, emitting its subterms first.
    fn theory_term(&mut self, value: &TheoryValue) -> GroundResult<u32> {
        if let Some(id) = self.terms.get(value) {
            return Ok(*id);
        }
        let (id, event) = match value {
            TheoryValue::Number(number) => {
                let id = self.allocate_term(value);
                (id, GroundEvent::TheoryNumber { id, number: *number })
            }
            TheoryValue::Name(name) => {
                let id = self.allocate_term(value);
                (id, GroundEvent::TheoryString { id, name: name.clone() })
            }
            TheoryValue::Function(name, args) => {
                let name = self.theory_term(&TheoryValue::Name(name.clone()))?;
                let args = self.theory_terms(args)?;
                let id = self.allocate_term(value);
                let kind = CompoundKind::Function(name);
                (id, GroundEvent::TheoryCompound { id, kind, args })
            }
            TheoryValue::Sequence(kind, args) => {
                let args = self.theory_terms(args)?;
                let id = self.allocate_term(value);
                let kind = match kind {
                    SequenceKind::Tuple => CompoundKind::Tuple,
                    SequenceKind::List => CompoundKind::List,
                    SequenceKind::Set => CompoundKind::Set,
                };
                (id, GroundEvent::TheoryCompound { id, kind, args })
            }
        };
        self.emit(event)?;
        Ok(id)
    }

    fn allocate_term(&mut self, value: &TheoryValue) -> u32 {
        let id = self.terms.len() as u32;
        self.terms.insert(value.clone(), id);
        id
    }

    fn theory_terms(&mut self, values: &[TheoryValue]) -> GroundResult<Vec<u32>> {
        values.iter().map(|v| self.theory_term(v)).collect()
    }

    // ==================== OUTPUT ====================

    /// `:- a, -a.` for every pair of complementary atoms.
    fn emit_complements(&mut self) -> GroundResult<()> {
        let pairs: Vec<(AtomId, AtomId)> = self
            .store
            .iter()
            .filter(|(_, symbol)| !symbol.is_positive())
            .filter_map(|(id, symbol)| {
                let positive = symbol.negate()?;
                Some((self.store.get(&positive)?, id))
            })
            .collect();
        for (positive, negative) in pairs {
            self.rule(
                false,
                Vec::new(),
                vec![Lit::positive(positive), Lit::positive(negative)],
            )?;
        }
        Ok(())
    }

    fn emit_externals(&mut self) -> GroundResult<()> {
        let program = self.program;
        for external in &program.externals {
            let solutions = external
                .plan
                .solutions(&self.store, Mode::Possible, &Bindings::new());
            for bindings in solutions {
                if self
                    .ground_literals(&external.body, &bindings, &external.text)?
                    .is_none()
                {
                    continue;
                }
                for symbol in eval_atom(&external.atom, &bindings) {
                    if let Some(atom) = self.store.get(&symbol) {
                        self.emit(GroundEvent::External {
                            atom,
                            value: external.value,
                        })?;
                    }
                }
            }
        }
        Ok(())
    }

    fn emit_outputs(&mut self) -> GroundResult<()> {
        let program = self.program;
        let atoms: Vec<GroundEvent> = self
            .store
            .iter()
            .filter(|(_, symbol)| {
                !program.hide_atoms
                    || symbol
                        .signature()
                        .is_some_and(|sig| program.show_signatures.contains(&sig))
            })
            .map(|(id, symbol)| GroundEvent::Output {
                symbol: symbol.clone(),
                condition: if self.facts.contains(&id) {
                    Vec::new()
                } else {
                    vec![Lit::positive(id)]
                },
            })
            .collect();
        for event in atoms {
            self.emit(event)?;
        }

        for show in &program.shows {
            let solutions = show.plan.solutions(&self.store, Mode::Possible, &Bindings::new());
            for bindings in solutions {
                let Some(condition) = self.ground_literals(&show.body, &bindings, &show.text)?
                else {
                    continue;
                };
                for symbol in eval_term(&show.term, &bindings) {
                    self.emit(GroundEvent::Output {
                        symbol,
                        condition: condition.clone(),
                    })?;
                }
            }
        }
        Ok(())
    }

    fn fresh_atom(&mut self) -> AtomId {
        let id = AtomId::new(self.next_atom);
        self.next_atom += 1;
        id
    }

    fn emit(&self, event: GroundEvent) -> GroundResult<()> {
        self.sink
            .send(event)
            .map_err(|_| GroundError::ObserverDisconnected)
    }
}

fn element_plan(condition: &[Literal], bindings: &Bindings, text: &str) -> GroundResult<Plan> {
    Plan::build(condition, &bindings.names())
        .map(|(plan, _)| plan)
        .map_err(|vars| GroundError::unsafe_variables(&vars, text))
}

fn literal_symbols(literal: &Literal, bindings: &Bindings) -> Vec<Symbol> {
    match &literal.atom {
        Atom::Symbolic(atom) => eval_atom(atom, bindings),
        _ => Vec::new(),
    }
}

fn bound(term: Option<&Term>, bindings: &Bindings) -> Option<i64> {
    term.and_then(|t| eval_single(t, bindings))
        .and_then(|s| s.as_number())
}

fn complement(lit: Lit) -> Lit {
    if lit.is_negative() {
        Lit::positive(lit.atom())
    } else {
        Lit::negative(lit.atom())
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
