//! Model computation for stratified normal programs.
//!
//! Predicates are evaluated one strongly connected component at a time, in
//! dependency order. Negative dependencies inside a component are rejected,
//! so the result is the unique stable model or none at all.

use std::collections::{HashMap, HashSet};

use metalp_core::{Signature, Symbol};
use metalp_parser::{Atom, Head, Literal, Sign};
use tracing::debug;

use crate::error::{GroundError, GroundResult};
use crate::eval::{eval_atom, eval_term, Bindings};
use crate::plan::Mode;
use crate::program::{PreparedRule, Program};
use crate::store::AtomStore;

/// A stable model.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    atoms: Vec<Symbol>,
    shown: Vec<Symbol>,
}

impl Model {
    /// True atoms, in derivation order.
    pub fn atoms(&self) -> &[Symbol] {
        &self.atoms
    }

    /// Symbols selected by the program's show directives.
    pub fn shown(&self) -> &[Symbol] {
        &self.shown
    }

    /// Model symbols: all atoms when `all_atoms`, else the shown atoms, in
    /// atom order; followed by shown terms that are not atoms.
    pub fn symbols(&self, all_atoms: bool) -> Vec<Symbol> {
        let shown: HashSet<&Symbol> = self.shown.iter().collect();
        let atoms: HashSet<&Symbol> = self.atoms.iter().collect();
        let mut out: Vec<Symbol> = self
            .atoms
            .iter()
            .filter(|a| all_atoms || shown.contains(a))
            .cloned()
            .collect();
        out.extend(self.shown.iter().filter(|s| !atoms.contains(s)).cloned());
        out
    }
}

pub(crate) fn solve(program: &Program) -> GroundResult<Vec<Model>> {
    let (rules, constraints) = split(program)?;
    let components = components(&rules);
    check_stratified(&rules, &components)?;

    let mut store = AtomStore::new();
    for rule in rules.iter().filter(|r| r.rule.body.is_empty()) {
        for symbol in head_symbols(rule, &Bindings::new()) {
            store.insert(symbol);
        }
    }

    for component in &components.order {
        let members: Vec<&PreparedRule> = rules
            .iter()
            .copied()
            .filter(|r| head_signature(r).is_some_and(|s| component.contains(&s)))
            .collect();
        loop {
            let mut changed = false;
            for rule in &members {
                for bindings in rule.plan.solutions(&store, Mode::Model, &Bindings::new()) {
                    for symbol in head_symbols(rule, &bindings) {
                        changed |= store.insert(symbol).1;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    for constraint in constraints {
        if !constraint
            .plan
            .solutions(&store, Mode::Model, &Bindings::new())
            .is_empty()
        {
            debug!(constraint = %constraint.text, "constraint violated");
            return Ok(Vec::new());
        }
    }
    let inconsistent = store
        .iter()
        .any(|(_, s)| !s.is_positive() && s.negate().is_some_and(|p| store.contains(&p)));
    if inconsistent {
        debug!("complementary atoms derived");
        return Ok(Vec::new());
    }

    let shown = shown(program, &store);
    Ok(vec![Model {
        atoms: store.into_symbols(),
        shown,
    }])
}

fn shown(program: &Program, store: &AtomStore) -> Vec<Symbol> {
    let mut shown: Vec<Symbol> = store
        .iter()
        .map(|(_, s)| s)
        .filter(|s| {
            !program.hide_atoms
                || s.signature()
                    .is_some_and(|sig| program.show_signatures.contains(&sig))
        })
        .cloned()
        .collect();
    let mut seen: HashSet<Symbol> = shown.iter().cloned().collect();
    for show in &program.shows {
        for bindings in show.plan.solutions(store, Mode::Model, &Bindings::new()) {
            for symbol in eval_term(&show.term, &bindings) {
                if seen.insert(symbol.clone()) {
                    shown.push(symbol);
                }
            }
        }
    }
    shown
}

/// Separate normal rules from constraints, rejecting everything else.
fn split(program: &Program) -> GroundResult<(Vec<&PreparedRule>, Vec<&PreparedRule>)> {
    let mut rules = Vec::new();
    let mut constraints = Vec::new();
    for rule in &program.rules {
        if rule
            .rule
            .body
            .iter()
            .any(|l| matches!(l.atom, Atom::Theory(_)))
        {
            return Err(GroundError::unsupported(format!(
                "solving theory atoms in: {}",
                rule.text
            )));
        }
        match &rule.rule.head {
            Head::Falsity => constraints.push(rule),
            Head::Literal(literal) if matches!(literal.atom, Atom::Symbolic(_)) => rules.push(rule),
            Head::Literal(_) => {
                return Err(GroundError::unsupported(format!(
                    "solving theory atoms in: {}",
                    rule.text
                )))
            }
            Head::Disjunction(_) | Head::Choice(_) => {
                return Err(GroundError::unsupported(format!(
                    "solving non-deterministic rules: {}",
                    rule.text
                )))
            }
        }
    }
    Ok((rules, constraints))
}

fn head_signature(rule: &PreparedRule) -> Option<Signature> {
    match &rule.rule.head {
        Head::Literal(literal) => match &literal.atom {
            Atom::Symbolic(atom) => Some(atom.signature()),
            _ => None,
        },
        _ => None,
    }
}

fn head_symbols(rule: &PreparedRule, bindings: &Bindings) -> Vec<Symbol> {
    match &rule.rule.head {
        Head::Literal(literal) => match &literal.atom {
            Atom::Symbolic(atom) => eval_atom(atom, bindings),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

// ==================== DEPENDENCIES ====================

/// Strongly connected components of the predicate dependency graph,
/// dependencies first.
struct Components {
    order: Vec<Vec<Signature>>,
    index: HashMap<Signature, usize>,
}

fn components(rules: &[&PreparedRule]) -> Components {
    let mut nodes: Vec<Signature> = Vec::new();
    let mut edges: HashMap<Signature, Vec<Signature>> = HashMap::new();
    for rule in rules {
        if let Some(head) = head_signature(rule) {
            if !nodes.contains(&head) {
                nodes.push(head.clone());
            }
            let targets = edges.entry(head).or_default();
            for literal in &rule.rule.body {
                targets.extend(dependencies(literal).into_iter().map(|(sig, _)| sig));
            }
        }
    }

    let mut tarjan = Tarjan {
        edges: &edges,
        counter: 0,
        indices: HashMap::new(),
        lowlinks: HashMap::new(),
        stack: Vec::new(),
        order: Vec::new(),
    };
    for node in &nodes {
        if !tarjan.indices.contains_key(node) {
            tarjan.visit(node);
        }
    }

    let order = tarjan.order;
    let mut index = HashMap::new();
    for (i, component) in order.iter().enumerate() {
        for sig in component {
            index.insert(sig.clone(), i);
        }
    }
    Components { order, index }
}

struct Tarjan<'a> {
    edges: &'a HashMap<Signature, Vec<Signature>>,
    counter: usize,
    indices: HashMap<Signature, usize>,
    lowlinks: HashMap<Signature, usize>,
    stack: Vec<Signature>,
    order: Vec<Vec<Signature>>,
}

impl Tarjan<'_> {
    fn visit(&mut self, node: &Signature) {
        self.indices.insert(node.clone(), self.counter);
        self.lowlinks.insert(node.clone(), self.counter);
        self.counter += 1;
        self.stack.push(node.clone());

        let edges = self.edges;
        for target in edges.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            // Predicates without rules are plain inputs.
            if !edges.contains_key(target) {
                continue;
            }
            if !self.indices.contains_key(target) {
                self.visit(target);
                let low = self.lowlinks[target].min(self.lowlinks[node]);
                self.lowlinks.insert(node.clone(), low);
            } else if self.stack.contains(target) {
                let low = self.indices[target].min(self.lowlinks[node]);
                self.lowlinks.insert(node.clone(), low);
            }
        }

        if self.lowlinks[node] == self.indices[node] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                let done = &member == node;
                component.push(member);
                if done {
                    break;
                }
            }
            self.order.push(component);
        }
    }
}

/// Predicates a body literal reads, with whether the dependency is
/// positive. Everything under an aggregate or a condition counts as
/// negative.
fn dependencies(literal: &Literal) -> Vec<(Signature, bool)> {
    match &literal.atom {
        Atom::Symbolic(atom) => vec![(atom.signature(), literal.sign == Sign::Positive)],
        Atom::Aggregate(aggregate) => {
            nested(aggregate.elements.iter().flat_map(|e| e.condition.iter()))
        }
        Atom::Conditional(conditional) => {
            nested(std::iter::once(&*conditional.literal).chain(conditional.condition.iter()))
        }
        Atom::Comparison(_) | Atom::Boolean(_) | Atom::Theory(_) => Vec::new(),
    }
}

fn nested<'a>(literals: impl Iterator<Item = &'a Literal>) -> Vec<(Signature, bool)> {
    literals
        .flat_map(dependencies)
        .map(|(sig, _)| (sig, false))
        .collect()
}

fn check_stratified(rules: &[&PreparedRule], components: &Components) -> GroundResult<()> {
    for rule in rules {
        let Some(head) = head_signature(rule) else {
            continue;
        };
        for literal in &rule.rule.body {
            for (target, positive) in dependencies(literal) {
                if positive {
                    continue;
                }
                if components.index.get(&head) == components.index.get(&target)
                    && components.index.contains_key(&target)
                {
                    return Err(GroundError::unsupported(format!(
                        "program is not stratified: {head} depends negatively on {target} in: {}",
                        rule.text
                    )));
                }
            }
        }
    }
    Ok(())
}
