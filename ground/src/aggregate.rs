//! Body aggregate evaluation during instantiation.
//!
//! Over a model an aggregate has exactly one value. Over possibly true atoms
//! it has every value some subset of its elements could produce.

use std::collections::BTreeSet;

use metalp_core::Symbol;
use metalp_parser::{Aggregate, AggregateFunction, ComparisonOp};

use crate::eval::{eval_single, Bindings};
use crate::plan::{Mode, Plan};
use crate::store::AtomStore;

/// Distinct element tuples whose condition holds, in element order.
pub(crate) fn element_tuples(
    aggregate: &Aggregate,
    plans: &[Plan],
    store: &AtomStore,
    mode: Mode,
    bindings: &Bindings,
) -> Vec<Vec<Symbol>> {
    let mut tuples: Vec<Vec<Symbol>> = Vec::new();
    for (element, plan) in aggregate.elements.iter().zip(plans) {
        for local in plan.solutions(store, mode, bindings) {
            let Some(tuple) = element
                .terms
                .iter()
                .map(|t| eval_single(t, &local))
                .collect::<Option<Vec<_>>>()
            else {
                continue;
            };
            if !tuples.contains(&tuple) {
                tuples.push(tuple);
            }
        }
    }
    tuples
}

/// What a tuple contributes; `None` when the function ignores it.
pub(crate) fn weight(function: AggregateFunction, tuple: &[Symbol]) -> Option<Symbol> {
    match function {
        AggregateFunction::Count => Some(Symbol::number(1)),
        AggregateFunction::Sum => tuple.first().filter(|w| w.as_number().is_some()).cloned(),
        AggregateFunction::SumPlus => tuple
            .first()
            .filter(|w| w.as_number().is_some_and(|n| n > 0))
            .cloned(),
        AggregateFunction::Min | AggregateFunction::Max => tuple.first().cloned(),
    }
}

/// Value of the aggregate over `tuples`: the single value in a model, the
/// candidate values over possible atoms.
pub(crate) fn values(function: AggregateFunction, tuples: &[Vec<Symbol>], mode: Mode) -> Vec<Symbol> {
    let weights: Vec<Symbol> = tuples.iter().filter_map(|t| weight(function, t)).collect();
    match (function, mode) {
        (AggregateFunction::Min, Mode::Model) => {
            vec![weights.into_iter().min().unwrap_or(Symbol::Supremum)]
        }
        (AggregateFunction::Max, Mode::Model) => {
            vec![weights.into_iter().max().unwrap_or(Symbol::Infimum)]
        }
        (AggregateFunction::Min, Mode::Possible) => extremes(weights, Symbol::Supremum),
        (AggregateFunction::Max, Mode::Possible) => extremes(weights, Symbol::Infimum),
        (_, Mode::Model) => {
            let total = weights
                .iter()
                .filter_map(Symbol::as_number)
                .fold(0i64, i64::saturating_add);
            vec![Symbol::number(total)]
        }
        (_, Mode::Possible) => {
            let mut sums = BTreeSet::from([0i64]);
            for weight in weights.iter().filter_map(Symbol::as_number) {
                let shifted: Vec<i64> = sums.iter().map(|s| s.saturating_add(weight)).collect();
                sums.extend(shifted);
            }
            sums.into_iter().map(Symbol::number).collect()
        }
    }
}

fn extremes(mut weights: Vec<Symbol>, empty: Symbol) -> Vec<Symbol> {
    weights.push(empty);
    weights.sort();
    weights.dedup();
    weights
}

/// Whether `value` satisfies both guards; unevaluable guards fail.
pub(crate) fn guards_hold(aggregate: &Aggregate, value: &Symbol, bindings: &Bindings) -> bool {
    let left = aggregate.left.as_ref().map_or(Some(true), |guard| {
        eval_single(&guard.term, bindings).map(|g| guard.op.holds(g.cmp(value)))
    });
    let right = aggregate.right.as_ref().map_or(Some(true), |guard| {
        eval_single(&guard.term, bindings).map(|g| guard.op.holds(value.cmp(&g)))
    });
    left == Some(true) && right == Some(true)
}

/// `g op value` read as `value op' g`.
pub(crate) fn flip(op: ComparisonOp) -> ComparisonOp {
    match op {
        ComparisonOp::Lt => ComparisonOp::Gt,
        ComparisonOp::LtEq => ComparisonOp::GtEq,
        ComparisonOp::Gt => ComparisonOp::Lt,
        ComparisonOp::GtEq => ComparisonOp::LtEq,
        ComparisonOp::Eq | ComparisonOp::NotEq => op,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuples(weights: &[i64]) -> Vec<Vec<Symbol>> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| vec![Symbol::number(*w), Symbol::number(i as i64)])
            .collect()
    }

    fn numbers(values: Vec<Symbol>) -> Vec<i64> {
        values.iter().filter_map(Symbol::as_number).collect()
    }

    #[test]
    fn test_model_values() {
        let t = tuples(&[3, -1, 5]);
        assert_eq!(numbers(values(AggregateFunction::Count, &t, Mode::Model)), vec![3]);
        assert_eq!(numbers(values(AggregateFunction::Sum, &t, Mode::Model)), vec![7]);
        assert_eq!(numbers(values(AggregateFunction::SumPlus, &t, Mode::Model)), vec![8]);
        assert_eq!(numbers(values(AggregateFunction::Min, &t, Mode::Model)), vec![-1]);
        assert_eq!(numbers(values(AggregateFunction::Max, &t, Mode::Model)), vec![5]);
    }

    #[test]
    fn test_empty_extremes() {
        assert_eq!(
            values(AggregateFunction::Min, &[], Mode::Model),
            vec![Symbol::Supremum]
        );
        assert_eq!(
            values(AggregateFunction::Max, &[], Mode::Model),
            vec![Symbol::Infimum]
        );
    }

    #[test]
    fn test_possible_sums_are_subset_sums() {
        let t = tuples(&[2, 3]);
        assert_eq!(
            numbers(values(AggregateFunction::Sum, &t, Mode::Possible)),
            vec![0, 2, 3, 5]
        );
        assert_eq!(
            numbers(values(AggregateFunction::Count, &t, Mode::Possible)),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_flip() {
        assert_eq!(flip(ComparisonOp::Lt), ComparisonOp::Gt);
        assert_eq!(flip(ComparisonOp::NotEq), ComparisonOp::NotEq);
    }
}
