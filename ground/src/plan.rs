//! Body ordering and instantiation.
//!
//! A plan orders the literals of a body (or condition) so that every literal
//! is either a positive atom to match, an assignment `X = t`, or a test whose
//! variables are already bound. Literals that never qualify make the
//! enclosing statement unsafe.
//!
//! Aggregates and conditional literals come last, once everything else has
//! bound what it can; their conditions get plans of their own. An aggregate
//! with an `=` guard over unbound variables assigns them.

use metalp_parser::{Aggregate, Atom, Comparison, ComparisonOp, Literal, Sign, SymbolicAtom, Term};

use crate::aggregate::{element_tuples, guards_hold, values};
use crate::eval::{binding_variables, compare, eval_atom, eval_term, match_atom, match_term, Bindings};
use crate::store::AtomStore;

/// How negation is read during instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Over possibly true atoms: default negation always holds.
    Possible,
    /// Over a model under construction: `not a` holds when `a` is absent.
    Model,
}

#[derive(Debug, Clone)]
enum Step {
    Match(SymbolicAtom),
    Assign { pattern: Term, value: Term },
    Test(Literal),
    Aggregate {
        sign: Sign,
        aggregate: Aggregate,
        elements: Vec<Plan>,
        /// Guard term bound to each value of the aggregate.
        assign: Option<Term>,
    },
    /// Holds when `literal` holds for every solution of `condition`.
    Conditional { literal: Literal, condition: Plan },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    /// Order `literals` given the variables `bound` beforehand.
    ///
    /// Returns the plan with the variables bound after it, or the unsafe
    /// variables.
    pub(crate) fn build(
        literals: &[Literal],
        bound: &[String],
    ) -> Result<(Plan, Vec<String>), Vec<String>> {
        let mut bound = bound.to_vec();
        let (mut deferred, mut remaining): (Vec<&Literal>, Vec<&Literal>) =
            literals.iter().partition(|l| is_deferred(l));
        let mut steps = Vec::new();

        loop {
            if let Some(i) = remaining.iter().position(|l| is_test(l, &bound)) {
                steps.push(Step::Test(remaining.remove(i).clone()));
                continue;
            }
            if let Some((i, pattern, value)) = remaining
                .iter()
                .enumerate()
                .find_map(|(i, l)| assignment(l, &bound).map(|(p, v)| (i, p, v)))
            {
                remaining.remove(i);
                extend_bound(&mut bound, &pattern);
                steps.push(Step::Assign { pattern, value });
                continue;
            }
            let matched = remaining.iter().position(|l| match l {
                Literal {
                    sign: Sign::Positive,
                    atom: Atom::Symbolic(atom),
                } => atom
                    .args
                    .iter()
                    .all(|arg| binding_variables(arg, &bound).is_some()),
                _ => false,
            });
            if let Some(i) = matched {
                if let Atom::Symbolic(atom) = &remaining.remove(i).atom {
                    for arg in &atom.args {
                        extend_bound(&mut bound, arg);
                    }
                    steps.push(Step::Match(atom.clone()));
                }
                continue;
            }
            if let Some((i, pattern)) = deferred
                .iter()
                .enumerate()
                .find_map(|(i, l)| aggregate_assignment(l, &bound).map(|p| (i, p)))
            {
                let literal = deferred.remove(i);
                steps.push(deferred_step(literal, Some(pattern.clone()), &bound)?);
                extend_bound(&mut bound, &pattern);
                continue;
            }
            break;
        }

        let mut unsafe_vars = Vec::new();
        for literal in remaining.iter().chain(deferred.iter()) {
            for var in literal_variables(literal) {
                if !bound.contains(&var) && !unsafe_vars.contains(&var) {
                    unsafe_vars.push(var);
                }
            }
        }
        if !unsafe_vars.is_empty() {
            return Err(unsafe_vars);
        }
        for literal in deferred {
            steps.push(deferred_step(literal, None, &bound)?);
        }
        Ok((Plan { steps }, bound))
    }

    /// All extensions of `seed` satisfying the plan over `store`.
    pub(crate) fn solutions(&self, store: &AtomStore, mode: Mode, seed: &Bindings) -> Vec<Bindings> {
        let mut out = Vec::new();
        let mut bindings = seed.clone();
        self.extend(0, store, mode, &mut bindings, &mut out);
        out
    }

    fn extend(
        &self,
        index: usize,
        store: &AtomStore,
        mode: Mode,
        bindings: &mut Bindings,
        out: &mut Vec<Bindings>,
    ) {
        let Some(step) = self.steps.get(index) else {
            out.push(bindings.clone());
            return;
        };
        match step {
            Step::Match(atom) => {
                if is_bound(atom, bindings) {
                    if eval_atom(atom, bindings).iter().any(|s| store.contains(s)) {
                        self.extend(index + 1, store, mode, bindings, out);
                    }
                    return;
                }
                for &id in store.with_signature(&atom.signature()) {
                    let mark = bindings.mark();
                    if match_atom(atom, store.symbol(id), bindings) {
                        self.extend(index + 1, store, mode, bindings, out);
                    }
                    bindings.reset(mark);
                }
            }
            Step::Assign { pattern, value } => {
                for value in eval_term(value, bindings) {
                    let mark = bindings.mark();
                    if match_term(pattern, &value, bindings) {
                        self.extend(index + 1, store, mode, bindings, out);
                    }
                    bindings.reset(mark);
                }
            }
            Step::Test(literal) => {
                if test(literal, store, mode, bindings) {
                    self.extend(index + 1, store, mode, bindings, out);
                }
            }
            Step::Aggregate {
                sign,
                aggregate,
                elements,
                assign,
            } => {
                let tuples = element_tuples(aggregate, elements, store, mode, bindings);
                let values = values(aggregate.function, &tuples, mode);
                if let Some(pattern) = assign {
                    for value in values {
                        let mark = bindings.mark();
                        if match_term(pattern, &value, bindings)
                            && guards_hold(aggregate, &value, bindings)
                        {
                            self.extend(index + 1, store, mode, bindings, out);
                        }
                        bindings.reset(mark);
                    }
                    return;
                }
                let holds = || values.iter().any(|v| guards_hold(aggregate, v, bindings));
                let passes = match (sign, mode) {
                    (Sign::Negative, Mode::Possible) => true,
                    (Sign::Negative, Mode::Model) => !holds(),
                    (Sign::Positive | Sign::DoubleNegative, _) => holds(),
                };
                if passes {
                    self.extend(index + 1, store, mode, bindings, out);
                }
            }
            Step::Conditional { literal, condition } => {
                let passes = mode == Mode::Possible
                    || condition
                        .solutions(store, mode, bindings)
                        .iter()
                        .all(|local| test(literal, store, mode, local));
                if passes {
                    self.extend(index + 1, store, mode, bindings, out);
                }
            }
        }
    }
}

/// Step for an aggregate or conditional literal, with plans for its
/// conditions given the variables `bound` so far.
fn deferred_step(
    literal: &Literal,
    assign: Option<Term>,
    bound: &[String],
) -> Result<Step, Vec<String>> {
    match &literal.atom {
        Atom::Aggregate(aggregate) => {
            let mut elements = Vec::with_capacity(aggregate.elements.len());
            for element in &aggregate.elements {
                let (plan, local) = Plan::build(&element.condition, bound)?;
                let mut vars = Vec::new();
                for term in &element.terms {
                    term.collect_variables(&mut vars);
                }
                require_bound(&vars, &local)?;
                elements.push(plan);
            }
            Ok(Step::Aggregate {
                sign: literal.sign,
                aggregate: aggregate.clone(),
                elements,
                assign,
            })
        }
        Atom::Conditional(conditional) => {
            let (condition, local) = Plan::build(&conditional.condition, bound)?;
            require_bound(&literal_variables(&conditional.literal), &local)?;
            Ok(Step::Conditional {
                literal: (*conditional.literal).clone(),
                condition,
            })
        }
        _ => Ok(Step::Test(literal.clone())),
    }
}

fn require_bound(vars: &[String], bound: &[String]) -> Result<(), Vec<String>> {
    let mut missing: Vec<String> = Vec::new();
    for var in vars {
        if !bound.contains(var) && !missing.contains(var) {
            missing.push(var.clone());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

fn test(literal: &Literal, store: &AtomStore, mode: Mode, bindings: &Bindings) -> bool {
    match &literal.atom {
        Atom::Comparison(comparison) => {
            compare(comparison, bindings) != (literal.sign == Sign::Negative)
        }
        Atom::Boolean(value) => *value != (literal.sign == Sign::Negative),
        // Aggregates and conditional literals are planned as their own steps.
        Atom::Theory(_) | Atom::Aggregate(_) | Atom::Conditional(_) => true,
        Atom::Symbolic(atom) => {
            let present = || eval_atom(atom, bindings).iter().any(|s| store.contains(s));
            match (literal.sign, mode) {
                (Sign::Negative, Mode::Possible) => true,
                (Sign::Negative, Mode::Model) => !present(),
                (Sign::Positive | Sign::DoubleNegative, _) => present(),
            }
        }
    }
}

fn is_bound(atom: &SymbolicAtom, bindings: &Bindings) -> bool {
    let mut vars = Vec::new();
    for arg in &atom.args {
        arg.collect_variables(&mut vars);
    }
    vars.iter().all(|v| bindings.get(v).is_some())
}

fn is_deferred(literal: &Literal) -> bool {
    matches!(literal.atom, Atom::Aggregate(_) | Atom::Conditional(_))
}

/// The guard term of `N = #agg {..}` when it binds new variables and the
/// other guard is already evaluable.
fn aggregate_assignment(literal: &Literal, bound: &[String]) -> Option<Term> {
    let Literal {
        sign: Sign::Positive,
        atom: Atom::Aggregate(aggregate),
    } = literal
    else {
        return None;
    };
    let evaluable = |t: &Term| {
        let mut vars = Vec::new();
        t.collect_variables(&mut vars);
        vars.iter().all(|v| bound.contains(v))
    };
    let binds = |t: &Term| binding_variables(t, bound).is_some_and(|v| !v.is_empty());
    let guards = [(&aggregate.left, &aggregate.right), (&aggregate.right, &aggregate.left)];
    guards.into_iter().find_map(|(guard, other)| {
        let guard = guard.as_ref().filter(|g| g.op == ComparisonOp::Eq)?;
        let other_ok = other.as_ref().map_or(true, |o| evaluable(&o.term));
        (binds(&guard.term) && other_ok).then(|| guard.term.clone())
    })
}

/// Literals checked once their variables are bound.
fn is_test(literal: &Literal, bound: &[String]) -> bool {
    let positive_atom = literal.sign == Sign::Positive && matches!(literal.atom, Atom::Symbolic(_));
    !positive_atom && literal_variables(literal).iter().all(|v| bound.contains(v))
}

/// `pattern = value` with `value` evaluable and `pattern` binding something.
fn assignment(literal: &Literal, bound: &[String]) -> Option<(Term, Term)> {
    let Literal {
        sign: Sign::Positive,
        atom: Atom::Comparison(Comparison {
            op: ComparisonOp::Eq,
            left,
            right,
        }),
    } = literal
    else {
        return None;
    };
    let evaluable = |t: &Term| {
        let mut vars = Vec::new();
        t.collect_variables(&mut vars);
        vars.iter().all(|v| bound.contains(v))
    };
    let binds = |t: &Term| binding_variables(t, bound).is_some_and(|v| !v.is_empty());
    if evaluable(right) && binds(left) {
        Some((left.clone(), right.clone()))
    } else if evaluable(left) && binds(right) {
        Some((right.clone(), left.clone()))
    } else {
        None
    }
}

fn extend_bound(bound: &mut Vec<String>, term: &Term) {
    let mut vars = Vec::new();
    term.collect_variables(&mut vars);
    for var in vars {
        if !bound.contains(&var) {
            bound.push(var);
        }
    }
}

/// Variables that must be bound for `literal` to be instantiated.
///
/// For theory atoms these are the variables of the name and guard, and for
/// aggregates those of the guards; element variables are local to their
/// conditions. Conditional literals have none of their own.
pub(crate) fn literal_variables(literal: &Literal) -> Vec<String> {
    let mut vars = Vec::new();
    match &literal.atom {
        Atom::Symbolic(atom) => {
            for arg in &atom.args {
                arg.collect_variables(&mut vars);
            }
        }
        Atom::Comparison(comparison) => {
            comparison.left.collect_variables(&mut vars);
            comparison.right.collect_variables(&mut vars);
        }
        Atom::Boolean(_) => {}
        Atom::Theory(atom) => {
            atom.name.collect_variables(&mut vars);
            if let Some(guard) = &atom.guard {
                guard.term.collect_variables(&mut vars);
            }
        }
        Atom::Aggregate(aggregate) => {
            for guard in aggregate.left.iter().chain(aggregate.right.iter()) {
                guard.term.collect_variables(&mut vars);
            }
        }
        Atom::Conditional(_) => {}
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use metalp_core::Symbol;
    use metalp_parser::{parse_program, Statement};

    fn body(text: &str) -> Vec<Literal> {
        match parse_program(text).unwrap().remove(0) {
            Statement::Rule(rule) => rule.body,
            _ => panic!("Expected rule"),
        }
    }

    fn store(atoms: &[Symbol]) -> AtomStore {
        let mut store = AtomStore::new();
        for atom in atoms {
            store.insert(atom.clone());
        }
        store
    }

    fn edge(a: i64, b: i64) -> Symbol {
        Symbol::function("edge", vec![Symbol::number(a), Symbol::number(b)])
    }

    #[test]
    fn test_join_over_positive_atoms() {
        let literals = body("p(X,Z) :- edge(X,Y), edge(Y,Z).");
        let (plan, bound) = Plan::build(&literals, &[]).unwrap();
        assert_eq!(bound, vec!["X", "Y", "Z"]);

        let store = store(&[edge(1, 2), edge(2, 3), edge(3, 1)]);
        let solutions = plan.solutions(&store, Mode::Model, &Bindings::new());
        assert_eq!(solutions.len(), 3);
        assert_eq!(solutions[0].get("Z"), Some(&Symbol::number(3)));
    }

    #[test]
    fn test_unsafe_variables_are_reported() {
        let literals = body("p(X) :- not q(X), Y < 3.");
        match Plan::build(&literals, &[]) {
            Err(vars) => assert_eq!(vars, vec!["X", "Y"]),
            Ok(_) => panic!("Expected unsafe variables"),
        }
    }

    #[test]
    fn test_assignment_binds_variable() {
        let literals = body("p(Y) :- edge(X,_), Y = X + 10.");
        let (plan, _) = Plan::build(&literals, &[]).unwrap();
        let store = store(&[edge(1, 2)]);
        let solutions = plan.solutions(&store, Mode::Model, &Bindings::new());
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].get("Y"), Some(&Symbol::number(11)));
    }

    #[test]
    fn test_aggregates_wait_for_other_literals() {
        let literals = body("q(Y,N) :- N = #count { X : edge(X,Y) }, edge(Z,Y).");
        let (plan, bound) = Plan::build(&literals, &[]).unwrap();
        assert_eq!(bound.last().map(String::as_str), Some("N"));

        let store = store(&[edge(1, 3), edge(2, 3)]);
        let solutions = plan.solutions(&store, Mode::Model, &Bindings::new());
        assert!(solutions
            .iter()
            .all(|b| b.get("N") == Some(&Symbol::number(2))));
    }

    #[test]
    fn test_possible_assignment_covers_all_counts() {
        let literals = body("q(N) :- N = #count { X : edge(X,Z) }.");
        let (plan, _) = Plan::build(&literals, &[]).unwrap();
        let store = store(&[edge(1, 2), edge(2, 3)]);
        let counts: Vec<Option<i64>> = plan
            .solutions(&store, Mode::Possible, &Bindings::new())
            .iter()
            .map(|b| b.get("N").and_then(Symbol::as_number))
            .collect();
        assert_eq!(counts, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_conditional_literal_over_model() {
        let literals = body("q :- edge(X,Y) : edge(Y,X).");
        let (plan, _) = Plan::build(&literals, &[]).unwrap();
        let symmetric = store(&[edge(1, 2), edge(2, 1)]);
        let one_way = store(&[edge(1, 2)]);
        assert_eq!(plan.solutions(&symmetric, Mode::Model, &Bindings::new()).len(), 1);
        assert!(plan.solutions(&one_way, Mode::Model, &Bindings::new()).is_empty());
        assert_eq!(plan.solutions(&one_way, Mode::Possible, &Bindings::new()).len(), 1);
    }

    #[test]
    fn test_negation_depends_on_mode() {
        let literals = body("p(X) :- edge(X,Y), not edge(Y,X).");
        let (plan, _) = Plan::build(&literals, &[]).unwrap();
        let store = store(&[edge(1, 2), edge(2, 1), edge(2, 3)]);

        let possible = plan.solutions(&store, Mode::Possible, &Bindings::new());
        let certain = plan.solutions(&store, Mode::Model, &Bindings::new());
        assert_eq!(possible.len(), 3);
        assert_eq!(certain.len(), 1);
        assert_eq!(certain[0].get("X"), Some(&Symbol::number(2)));
    }
}
