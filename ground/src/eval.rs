//! Term evaluation and matching under variable bindings.

use metalp_core::Symbol;
use metalp_parser::{BinaryOp, Comparison, SymbolicAtom, Term, UnaryOp};

/// Variable assignments, kept as a stack so matching can backtrack.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Bindings {
    entries: Vec<(String, Symbol)>,
}

impl Bindings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Symbol> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub(crate) fn bind(&mut self, name: impl Into<String>, value: Symbol) {
        self.entries.push((name.into(), value));
    }

    /// Bound variable names, in binding order.
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.entries.len());
        for (name, _) in &self.entries {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    pub(crate) fn mark(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn reset(&mut self, mark: usize) {
        self.entries.truncate(mark);
    }
}

// ==================== EVALUATION ====================

/// All values of `term`; empty when an operation is undefined.
///
/// Intervals and function arguments multiply out.
pub(crate) fn eval_term(term: &Term, bindings: &Bindings) -> Vec<Symbol> {
    match term {
        Term::Symbol(sym) => vec![sym.clone()],
        Term::Variable(name) => bindings.get(name).cloned().into_iter().collect(),
        Term::Function { name, args } => {
            let mut tuples: Vec<Vec<Symbol>> = vec![Vec::new()];
            for arg in args {
                let values = eval_term(arg, bindings);
                let mut next = Vec::with_capacity(tuples.len() * values.len());
                for prefix in &tuples {
                    for value in &values {
                        let mut tuple = prefix.clone();
                        tuple.push(value.clone());
                        next.push(tuple);
                    }
                }
                tuples = next;
            }
            tuples
                .into_iter()
                .map(|args| Symbol::function(name.clone(), args))
                .collect()
        }
        Term::Unary(UnaryOp::Minus, inner) => eval_term(inner, bindings)
            .into_iter()
            .filter_map(|value| match value {
                Symbol::Number(n) => n.checked_neg().map(Symbol::Number),
                other => other.negate(),
            })
            .collect(),
        Term::Binary(op, left, right) => {
            let left = numbers(eval_term(left, bindings));
            let right = numbers(eval_term(right, bindings));
            let mut out = Vec::new();
            for l in &left {
                for r in &right {
                    if let Some(n) = apply(*op, *l, *r) {
                        out.push(Symbol::Number(n));
                    }
                }
            }
            out
        }
        Term::Interval(lower, upper) => {
            let lower = numbers(eval_term(lower, bindings));
            let upper = numbers(eval_term(upper, bindings));
            let mut out = Vec::new();
            for l in &lower {
                for u in &upper {
                    out.extend((*l..=*u).map(Symbol::Number));
                }
            }
            out
        }
    }
}

/// The value of `term` when it has exactly one.
pub(crate) fn eval_single(term: &Term, bindings: &Bindings) -> Option<Symbol> {
    let mut values = eval_term(term, bindings);
    if values.len() == 1 {
        values.pop()
    } else {
        None
    }
}

/// Ground instances of a symbolic atom.
pub(crate) fn eval_atom(atom: &SymbolicAtom, bindings: &Bindings) -> Vec<Symbol> {
    let function = Term::Function {
        name: atom.name.clone(),
        args: atom.args.clone(),
    };
    eval_term(&function, bindings)
        .into_iter()
        .filter_map(|sym| if atom.positive { Some(sym) } else { sym.negate() })
        .collect()
}

/// Whether some pair of values satisfies the comparison.
pub(crate) fn compare(comparison: &Comparison, bindings: &Bindings) -> bool {
    let left = eval_term(&comparison.left, bindings);
    let right = eval_term(&comparison.right, bindings);
    left.iter().any(|l| {
        right
            .iter()
            .any(|r| comparison.op.holds(l.cmp(r)))
    })
}

fn numbers(values: Vec<Symbol>) -> Vec<i64> {
    values.iter().filter_map(Symbol::as_number).collect()
}

fn apply(op: BinaryOp, l: i64, r: i64) -> Option<i64> {
    match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => l.checked_div(r),
        BinaryOp::Mod => l.checked_rem(r),
        BinaryOp::Pow => u32::try_from(r).ok().and_then(|r| l.checked_pow(r)),
    }
}

// ==================== MATCHING ====================

/// Unify `pattern` with `value`, extending `bindings`.
///
/// On failure the bindings may hold partial assignments; callers reset to a
/// mark taken beforehand.
pub(crate) fn match_term(pattern: &Term, value: &Symbol, bindings: &mut Bindings) -> bool {
    match pattern {
        Term::Symbol(sym) => sym == value,
        Term::Variable(name) => match bindings.get(name) {
            Some(bound) => bound == value,
            None => {
                bindings.bind(name.clone(), value.clone());
                true
            }
        },
        Term::Function { name, args } => match value {
            Symbol::Function {
                name: value_name,
                args: value_args,
                positive: true,
            } if value_name == name && value_args.len() == args.len() => args
                .iter()
                .zip(value_args)
                .all(|(pattern, value)| match_term(pattern, value, bindings)),
            _ => false,
        },
        Term::Unary(UnaryOp::Minus, inner) => match value {
            Symbol::Number(n) => match n.checked_neg() {
                Some(negated) => match_term(inner, &Symbol::Number(negated), bindings),
                None => false,
            },
            Symbol::Function { positive: false, .. } => match value.negate() {
                Some(negated) => match_term(inner, &negated, bindings),
                None => false,
            },
            _ => false,
        },
        Term::Binary(..) | Term::Interval(..) => {
            eval_term(pattern, bindings).iter().any(|v| v == value)
        }
    }
}

/// Match the arguments of `atom` against a ground atom of the same signature.
pub(crate) fn match_atom(atom: &SymbolicAtom, value: &Symbol, bindings: &mut Bindings) -> bool {
    let args = value.args();
    args.len() == atom.args.len()
        && value.is_positive() == atom.positive
        && atom
            .args
            .iter()
            .zip(args)
            .all(|(pattern, value)| match_term(pattern, value, bindings))
}

/// Variables `term` binds when matched, given the already `bound` ones.
///
/// `None` when matching is impossible because an arithmetic subterm still
/// has unbound variables.
pub(crate) fn binding_variables(term: &Term, bound: &[String]) -> Option<Vec<String>> {
    let mut out = Vec::new();
    collect_binding(term, bound, &mut out).then_some(out)
}

fn collect_binding(term: &Term, bound: &[String], out: &mut Vec<String>) -> bool {
    match term {
        Term::Symbol(_) => true,
        Term::Variable(name) => {
            if !bound.contains(name) && !out.contains(name) {
                out.push(name.clone());
            }
            true
        }
        Term::Function { args, .. } => args.iter().all(|arg| collect_binding(arg, bound, out)),
        Term::Unary(UnaryOp::Minus, inner) => collect_binding(inner, bound, out),
        Term::Binary(..) | Term::Interval(..) => {
            let mut vars = Vec::new();
            term.collect_variables(&mut vars);
            vars.iter().all(|v| bound.contains(v))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metalp_parser::parse_term;

    fn eval(text: &str, bindings: &Bindings) -> Vec<Symbol> {
        eval_term(&parse_term(text).unwrap(), bindings)
    }

    #[test]
    fn test_arithmetic_and_intervals() {
        let mut b = Bindings::new();
        b.bind("X", Symbol::number(3));

        assert_eq!(eval("X*2+1", &b), vec![Symbol::number(7)]);
        assert_eq!(eval("2**X", &b), vec![Symbol::number(8)]);
        assert_eq!(eval("7\\X", &b), vec![Symbol::number(1)]);
        assert_eq!(
            eval("f(1..2)", &b),
            vec![
                Symbol::function("f", vec![Symbol::number(1)]),
                Symbol::function("f", vec![Symbol::number(2)]),
            ]
        );
    }

    #[test]
    fn test_undefined_arithmetic_yields_nothing() {
        let b = Bindings::new();
        assert!(eval("1/0", &b).is_empty());
        assert!(eval("a+1", &b).is_empty());
        assert!(eval("2**(-1)", &b).is_empty());
    }

    #[test]
    fn test_match_binds_and_checks() {
        let mut b = Bindings::new();
        let pattern = parse_term("f(X,-Y,X)").unwrap();
        let value = Symbol::function(
            "f",
            vec![Symbol::number(1), Symbol::number(-2), Symbol::number(1)],
        );
        assert!(match_term(&pattern, &value, &mut b));
        assert_eq!(b.get("Y"), Some(&Symbol::number(2)));

        let mut b = Bindings::new();
        let value = Symbol::function(
            "f",
            vec![Symbol::number(1), Symbol::number(2), Symbol::number(3)],
        );
        assert!(!match_term(&pattern, &value, &mut b));
    }

    #[test]
    fn test_binding_variables_skips_arithmetic() {
        let term = parse_term("p(X, Y+1)").unwrap();
        assert_eq!(binding_variables(&term, &[]), None);
        assert_eq!(
            binding_variables(&term, &["Y".to_string()]),
            Some(vec!["X".to_string()])
        );
    }
}
