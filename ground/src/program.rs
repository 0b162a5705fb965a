//! Program preparation: parts, constants, anonymous variables, theory
//! checks and safety.

use std::collections::HashMap;

use metalp_core::{Signature, Symbol};
use metalp_parser::{
    Atom, ConstKind, Directive, Head, Literal, Rule, ShowKind, Statement, SymbolicAtom,
    TheoryAtom, TheoryTerm, Term,
};
use tracing::debug;

use crate::error::{GroundError, GroundResult};
use crate::event::TruthValue;
use crate::plan::{literal_variables, Plan};
use crate::theory::{Placement, TheoryRegistry};

/// A rule ready for instantiation.
#[derive(Debug)]
pub(crate) struct PreparedRule {
    pub(crate) rule: Rule,
    pub(crate) plan: Plan,
    /// Source rendering, for messages.
    pub(crate) text: String,
}

/// `#show term : body.`
#[derive(Debug)]
pub(crate) struct PreparedShow {
    pub(crate) term: Term,
    pub(crate) body: Vec<Literal>,
    pub(crate) plan: Plan,
    pub(crate) text: String,
}

/// `#external atom : body. [value]`
#[derive(Debug)]
pub(crate) struct PreparedExternal {
    pub(crate) atom: SymbolicAtom,
    pub(crate) body: Vec<Literal>,
    pub(crate) plan: Plan,
    pub(crate) value: TruthValue,
    pub(crate) text: String,
}

/// The `base` part of a program, checked and rewritten.
#[derive(Debug, Default)]
pub(crate) struct Program {
    pub(crate) rules: Vec<PreparedRule>,
    pub(crate) shows: Vec<PreparedShow>,
    pub(crate) show_signatures: Vec<Signature>,
    /// Set by `#show.` or any `#show p/n.`: atoms are hidden unless listed.
    pub(crate) hide_atoms: bool,
    pub(crate) externals: Vec<PreparedExternal>,
}

impl Program {
    /// Prepare `statements`; `overrides` take precedence over `#const`.
    pub(crate) fn prepare(
        statements: Vec<Statement>,
        overrides: &[(String, Term)],
    ) -> GroundResult<Program> {
        let constants = collect_constants(&statements, overrides);
        let registry = TheoryRegistry::new(
            statements
                .iter()
                .filter_map(|s| match s {
                    Statement::Theory(def) => Some(def.clone()),
                    _ => None,
                })
                .collect(),
        );

        let mut program = Program::default();
        let mut part = "base".to_string();

        for statement in statements {
            if let Statement::Directive(Directive::Program(decl)) = &statement {
                part = decl.name.clone();
                continue;
            }
            if part != "base" {
                debug!(part = %part, "skipping statement outside base part");
                continue;
            }
            match statement {
                Statement::Rule(rule) => {
                    let prepared = prepare_rule(rule, &constants, &registry)?;
                    program.rules.push(prepared);
                }
                Statement::Directive(Directive::Show(show)) => match show.kind {
                    ShowKind::Nothing => program.hide_atoms = true,
                    ShowKind::Signature(signature) => {
                        program.hide_atoms = true;
                        program.show_signatures.push(signature);
                    }
                    ShowKind::Term { term, body } => {
                        let text = format!("#show {term}");
                        let mut rewriter = Rewriter::new(&constants);
                        let mut term = term;
                        let mut body = body;
                        rewriter.term(&mut term);
                        rewriter.literals(&mut body);
                        check_body(&body, &text)?;
                        let (plan, bound) = Plan::build(&body, &[])
                            .map_err(|vars| GroundError::unsafe_variables(&vars, &text))?;
                        check_bound(&term_variables(&term), &bound, &text)?;
                        program.shows.push(PreparedShow {
                            term,
                            body,
                            plan,
                            text,
                        });
                    }
                },
                Statement::Directive(Directive::External(external)) => {
                    let text = format!("#external {}", external.atom.to_term());
                    let mut rewriter = Rewriter::new(&constants);
                    let mut atom = external.atom;
                    let mut body = external.body;
                    rewriter.atom_args(&mut atom);
                    rewriter.literals(&mut body);
                    check_body(&body, &text)?;
                    let (plan, bound) = Plan::build(&body, &[])
                        .map_err(|vars| GroundError::unsafe_variables(&vars, &text))?;
                    check_bound(&term_variables(&atom.to_term()), &bound, &text)?;
                    let value = match external.value.as_ref().and_then(Term::as_symbol) {
                        None if external.value.is_none() => TruthValue::False,
                        Some(sym) => truth_value(&sym)
                            .ok_or_else(|| GroundError::unsupported(format!("external value {sym}")))?,
                        None => {
                            return Err(GroundError::unsupported(format!(
                                "non-constant external value in: {text}"
                            )))
                        }
                    };
                    program.externals.push(PreparedExternal {
                        atom,
                        body,
                        plan,
                        value,
                        text,
                    });
                }
                Statement::Directive(_) | Statement::Theory(_) | Statement::Comment(_) => {}
            }
        }

        Ok(program)
    }
}

fn truth_value(symbol: &Symbol) -> Option<TruthValue> {
    match symbol.name()? {
        "true" => Some(TruthValue::True),
        "false" => Some(TruthValue::False),
        "free" => Some(TruthValue::Free),
        "release" => Some(TruthValue::Release),
        _ => None,
    }
}

// ==================== CONSTANTS ====================

/// Resolve `#const` definitions: overrides first, then `[override]`
/// definitions, then the first default for each name.
fn collect_constants(
    statements: &[Statement],
    overrides: &[(String, Term)],
) -> HashMap<String, Term> {
    let mut constants: HashMap<String, Term> = overrides.iter().cloned().collect();
    let definitions: Vec<_> = statements
        .iter()
        .filter_map(|s| match s {
            Statement::Directive(Directive::Const(def)) => Some(def),
            _ => None,
        })
        .collect();

    for kind in [ConstKind::Override, ConstKind::Default] {
        for def in definitions.iter().filter(|d| d.kind == kind) {
            constants
                .entry(def.name.clone())
                .or_insert_with(|| def.value.clone());
        }
    }

    // Values may refer to other constants.
    for _ in 0..constants.len() {
        let snapshot = constants.clone();
        let mut changed = false;
        for value in constants.values_mut() {
            let before = value.clone();
            Rewriter::new(&snapshot).term(value);
            changed |= *value != before;
        }
        if !changed {
            break;
        }
    }
    constants
}

// ==================== REWRITING ====================

/// Replaces constants by their values and gives each `_` a fresh name.
struct Rewriter<'a> {
    constants: &'a HashMap<String, Term>,
    anonymous: usize,
}

impl<'a> Rewriter<'a> {
    fn new(constants: &'a HashMap<String, Term>) -> Self {
        Self {
            constants,
            anonymous: 0,
        }
    }

    fn term(&mut self, term: &mut Term) {
        match term {
            Term::Symbol(Symbol::Function { name, args, positive: true }) if args.is_empty() => {
                if let Some(value) = self.constants.get(name.as_str()) {
                    *term = value.clone();
                }
            }
            Term::Symbol(_) => {}
            Term::Variable(name) => {
                if name == "_" {
                    *name = format!("_{}", self.anonymous);
                    self.anonymous += 1;
                }
            }
            Term::Function { args, .. } => args.iter_mut().for_each(|a| self.term(a)),
            Term::Unary(_, inner) => self.term(inner),
            Term::Binary(_, left, right) | Term::Interval(left, right) => {
                self.term(left);
                self.term(right);
            }
        }
    }

    fn theory_term(&mut self, term: &mut TheoryTerm) {
        match term {
            TheoryTerm::Symbol(Symbol::Function { name, args, positive: true })
                if args.is_empty() =>
            {
                if let Some(sym) = self.constants.get(name.as_str()).and_then(Term::as_symbol) {
                    *term = TheoryTerm::Symbol(sym);
                }
            }
            TheoryTerm::Symbol(_) => {}
            TheoryTerm::Variable(name) => {
                if name == "_" {
                    *name = format!("_{}", self.anonymous);
                    self.anonymous += 1;
                }
            }
            TheoryTerm::Function { args: terms, .. } | TheoryTerm::Sequence { terms, .. } => {
                terms.iter_mut().for_each(|t| self.theory_term(t))
            }
            TheoryTerm::Unparsed(elements) => elements
                .iter_mut()
                .for_each(|e| self.theory_term(&mut e.term)),
        }
    }

    fn atom_args(&mut self, atom: &mut SymbolicAtom) {
        atom.args.iter_mut().for_each(|a| self.term(a));
    }

    fn theory_atom(&mut self, atom: &mut TheoryAtom) {
        // The name itself is not a constant reference.
        if let Term::Function { args, .. } = &mut atom.name {
            args.iter_mut().for_each(|a| self.term(a));
        }
        for element in &mut atom.elements {
            element.terms.iter_mut().for_each(|t| self.theory_term(t));
            self.literals(&mut element.condition);
        }
        if let Some(guard) = &mut atom.guard {
            self.theory_term(&mut guard.term);
        }
    }

    fn literal(&mut self, literal: &mut Literal) {
        match &mut literal.atom {
            Atom::Symbolic(atom) => self.atom_args(atom),
            Atom::Comparison(comparison) => {
                self.term(&mut comparison.left);
                self.term(&mut comparison.right);
            }
            Atom::Boolean(_) => {}
            Atom::Theory(atom) => self.theory_atom(atom),
            Atom::Aggregate(aggregate) => {
                for guard in aggregate.left.iter_mut().chain(aggregate.right.iter_mut()) {
                    self.term(&mut guard.term);
                }
                for element in &mut aggregate.elements {
                    element.terms.iter_mut().for_each(|t| self.term(t));
                    self.literals(&mut element.condition);
                }
            }
            Atom::Conditional(conditional) => {
                self.literal(&mut conditional.literal);
                self.literals(&mut conditional.condition);
            }
        }
    }

    fn literals(&mut self, literals: &mut [Literal]) {
        literals.iter_mut().for_each(|l| self.literal(l));
    }

    fn rule(&mut self, rule: &mut Rule) {
        match &mut rule.head {
            Head::Falsity => {}
            Head::Literal(literal) => self.literal(literal),
            Head::Disjunction(literals) => self.literals(literals),
            Head::Choice(choice) => {
                if let Some(lower) = &mut choice.lower {
                    self.term(lower);
                }
                if let Some(upper) = &mut choice.upper {
                    self.term(upper);
                }
                for element in &mut choice.elements {
                    self.literal(&mut element.literal);
                    self.literals(&mut element.condition);
                }
            }
        }
        self.literals(&mut rule.body);
    }
}

// ==================== CHECKS ====================

fn prepare_rule(
    mut rule: Rule,
    constants: &HashMap<String, Term>,
    registry: &TheoryRegistry,
) -> GroundResult<PreparedRule> {
    let text = rule.to_string();
    Rewriter::new(constants).rule(&mut rule);

    let is_fact = rule.body.is_empty();
    match &mut rule.head {
        Head::Falsity => {}
        Head::Literal(literal) => match &mut literal.atom {
            Atom::Symbolic(_) => {}
            Atom::Theory(atom) => {
                let placement = if is_fact {
                    Placement::Directive
                } else {
                    Placement::Head
                };
                *atom = registry.resolve_atom(atom, placement, &text)?;
            }
            Atom::Comparison(_) | Atom::Boolean(_) | Atom::Aggregate(_) | Atom::Conditional(_) => {
                return Err(GroundError::unsupported(format!(
                    "non-atomic rule head in: {text}"
                )))
            }
        },
        Head::Disjunction(literals) => {
            if literals
                .iter()
                .any(|l| !matches!(l.atom, Atom::Symbolic(_)))
            {
                return Err(GroundError::unsupported(format!(
                    "non-atomic disjunction element in: {text}"
                )));
            }
        }
        Head::Choice(choice) => {
            for element in &choice.elements {
                let atomic = matches!(element.literal.atom, Atom::Symbolic(_))
                    && element.literal.sign == metalp_parser::Sign::Positive;
                if !atomic {
                    return Err(GroundError::unsupported(format!(
                        "non-atomic choice element in: {text}"
                    )));
                }
                check_condition(&element.condition, &text)?;
            }
        }
    }

    for literal in &mut rule.body {
        match &mut literal.atom {
            Atom::Theory(atom) => {
                *atom = registry.resolve_atom(atom, Placement::Body, &text)?;
                for element in &atom.elements {
                    check_condition(&element.condition, &text)?;
                }
            }
            Atom::Aggregate(aggregate) => {
                for element in &aggregate.elements {
                    check_condition(&element.condition, &text)?;
                }
            }
            Atom::Conditional(conditional) => {
                check_condition(std::slice::from_ref(&*conditional.literal), &text)?;
                check_condition(&conditional.condition, &text)?;
            }
            Atom::Symbolic(_) | Atom::Comparison(_) | Atom::Boolean(_) => {}
        }
    }
    check_body(&rule.body, &text)?;

    let (plan, bound) =
        Plan::build(&rule.body, &[]).map_err(|vars| GroundError::unsafe_variables(&vars, &text))?;
    check_head(&rule.head, &bound, &text)?;
    for literal in &rule.body {
        if let Atom::Theory(atom) = &literal.atom {
            check_theory_elements(atom, &bound, &text)?;
        }
    }

    Ok(PreparedRule { rule, plan, text })
}

/// Body atoms must denote a single atom each.
fn check_body(body: &[Literal], text: &str) -> GroundResult<()> {
    for literal in body {
        if let Atom::Symbolic(atom) = &literal.atom {
            if atom.args.iter().any(has_interval) {
                return Err(GroundError::unsupported(format!(
                    "intervals in body atoms in: {text}"
                )));
            }
        }
    }
    Ok(())
}

fn check_condition(condition: &[Literal], text: &str) -> GroundResult<()> {
    for literal in condition {
        let construct = match literal.atom {
            Atom::Theory(_) => "theory atoms",
            Atom::Aggregate(_) => "aggregates",
            Atom::Conditional(_) => "conditional literals",
            Atom::Symbolic(_) | Atom::Comparison(_) | Atom::Boolean(_) => continue,
        };
        return Err(GroundError::unsupported(format!(
            "{construct} in conditions in: {text}"
        )));
    }
    check_body(condition, text)
}

fn check_head(head: &Head, bound: &[String], text: &str) -> GroundResult<()> {
    match head {
        Head::Falsity => Ok(()),
        Head::Literal(literal) => {
            check_bound(&literal_variables(literal), bound, text)?;
            if let Atom::Theory(atom) = &literal.atom {
                check_theory_elements(atom, bound, text)?;
            }
            Ok(())
        }
        Head::Disjunction(literals) => literals
            .iter()
            .try_for_each(|l| check_bound(&literal_variables(l), bound, text)),
        Head::Choice(choice) => {
            for bound_term in choice.lower.iter().chain(choice.upper.iter()) {
                check_bound(&term_variables(bound_term), bound, text)?;
            }
            for element in &choice.elements {
                let (_, local) = Plan::build(&element.condition, bound)
                    .map_err(|vars| GroundError::unsafe_variables(&vars, text))?;
                check_bound(&literal_variables(&element.literal), &local, text)?;
            }
            Ok(())
        }
    }
}

fn check_theory_elements(atom: &TheoryAtom, bound: &[String], text: &str) -> GroundResult<()> {
    for element in &atom.elements {
        let (_, local) = Plan::build(&element.condition, bound)
            .map_err(|vars| GroundError::unsafe_variables(&vars, text))?;
        let mut vars = Vec::new();
        for term in &element.terms {
            term.collect_variables(&mut vars);
        }
        check_bound(&vars, &local, text)?;
    }
    Ok(())
}

fn check_bound(vars: &[String], bound: &[String], text: &str) -> GroundResult<()> {
    let mut missing: Vec<String> = Vec::new();
    for var in vars {
        if !bound.contains(var) && !missing.contains(var) {
            missing.push(var.clone());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GroundError::unsafe_variables(&missing, text))
    }
}

fn term_variables(term: &Term) -> Vec<String> {
    let mut vars = Vec::new();
    term.collect_variables(&mut vars);
    vars
}

fn has_interval(term: &Term) -> bool {
    match term {
        Term::Interval(..) => true,
        Term::Symbol(_) | Term::Variable(_) => false,
        Term::Function { args, .. } => args.iter().any(has_interval),
        Term::Unary(_, inner) => has_interval(inner),
        Term::Binary(_, left, right) => has_interval(left) || has_interval(right),
    }
}
