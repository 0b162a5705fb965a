//! Symbol-table entries for theory terms.
//!
//! Terms that occur only inside theory atoms have no `output/2` fact, so the
//! reified program cannot name them. This pass appends one
//! `theory_symbol(ID,Symbol)` fact per distinct term that denotes a ground
//! symbol, using identifiers above every identifier already in use.

use std::collections::{HashMap, HashSet};

use metalp_core::Symbol;
use metalp_parser::parse_term;
use tracing::debug;

use crate::fact::{MetaFact, SequenceType};
use crate::log::MetaLog;

#[derive(Debug, Clone)]
enum TermNode {
    Number(i64),
    Name(String),
    Function { name: u32, args: u32 },
    Sequence { kind: SequenceType, args: u32 },
}

/// Theory structure of a log, indexed by identifier.
#[derive(Debug, Default)]
struct TheoryIndex {
    terms: HashMap<u32, TermNode>,
    tuples: HashMap<u32, Vec<(usize, u32)>>,
    elements: HashMap<u32, u32>,
    element_tuples: HashMap<u32, Vec<u32>>,
    symbols: HashMap<u32, Option<Symbol>>,
}

impl TheoryIndex {
    fn build(log: &MetaLog) -> Self {
        let mut index = Self::default();
        for fact in log.iter() {
            match fact {
                MetaFact::TheoryNumber { term, number } => {
                    index.terms.insert(*term, TermNode::Number(*number));
                }
                MetaFact::TheoryString { term, name } => {
                    index.terms.insert(*term, TermNode::Name(name.clone()));
                }
                MetaFact::TheoryFunction { term, name, args } => {
                    let node = TermNode::Function {
                        name: *name,
                        args: *args,
                    };
                    index.terms.insert(*term, node);
                }
                MetaFact::TheorySequence { term, kind, args } => {
                    let node = TermNode::Sequence {
                        kind: *kind,
                        args: *args,
                    };
                    index.terms.insert(*term, node);
                }
                MetaFact::TheoryTupleTerm {
                    tuple,
                    position,
                    term,
                } => index
                    .tuples
                    .entry(*tuple)
                    .or_default()
                    .push((*position, *term)),
                MetaFact::TheoryElement { element, terms, .. } => {
                    index.elements.insert(*element, *terms);
                }
                MetaFact::TheoryElementTupleElement { tuple, element } => {
                    index.element_tuples.entry(*tuple).or_default().push(*element)
                }
                _ => {}
            }
        }
        for members in index.tuples.values_mut() {
            members.sort_unstable();
        }
        index
    }

    fn tuple(&self, id: u32) -> Vec<u32> {
        self.tuples
            .get(&id)
            .map(|members| members.iter().map(|(_, term)| *term).collect())
            .unwrap_or_default()
    }

    /// Subterms in visiting order: a function's name term precedes its
    /// arguments.
    fn children(&self, term: u32) -> Vec<u32> {
        match self.terms.get(&term) {
            Some(TermNode::Function { name, args }) => {
                let mut children = vec![*name];
                children.extend(self.tuple(*args));
                children
            }
            Some(TermNode::Sequence { args, .. }) => self.tuple(*args),
            _ => Vec::new(),
        }
    }

    /// Ground symbol denoted by a term, if any.
    fn symbol(&mut self, term: u32) -> Option<Symbol> {
        if let Some(known) = self.symbols.get(&term) {
            return known.clone();
        }
        let symbol = match self.terms.get(&term).cloned() {
            Some(TermNode::Number(n)) => Some(Symbol::number(n)),
            Some(TermNode::Name(name)) => name_symbol(&name),
            Some(TermNode::Function { name, args }) => {
                let name = match self.symbol(name) {
                    Some(Symbol::Function {
                        name,
                        args,
                        positive: true,
                    }) if args.is_empty() && !name.is_empty() => Some(name),
                    _ => None,
                };
                name.and_then(|name| {
                    self.arguments(args)
                        .map(|args| Symbol::function(name, args))
                })
            }
            Some(TermNode::Sequence {
                kind: SequenceType::Tuple,
                args,
            }) => self.arguments(args).map(Symbol::tuple),
            Some(TermNode::Sequence { .. }) | None => None,
        };
        self.symbols.insert(term, symbol.clone());
        symbol
    }

    fn arguments(&mut self, tuple: u32) -> Option<Vec<Symbol>> {
        self.tuple(tuple).into_iter().map(|t| self.symbol(t)).collect()
    }
}

/// Constants and strings are names that parse as a ground term; operator
/// names do not.
fn name_symbol(name: &str) -> Option<Symbol> {
    parse_term(name).ok()?.as_symbol()
}

/// Theory terms of every theory atom, in occurrence order.
fn atom_terms(log: &MetaLog, index: &TheoryIndex) -> Vec<u32> {
    let mut roots = Vec::new();
    for fact in log.iter() {
        let (term, elements, guard) = match fact {
            MetaFact::TheoryAtom { term, elements, .. } => (*term, *elements, None),
            MetaFact::TheoryGuardedAtom {
                term,
                elements,
                guard,
                ..
            } => (*term, *elements, Some(*guard)),
            _ => continue,
        };
        roots.push(term);
        for element in index.element_tuples.get(&elements).into_iter().flatten() {
            if let Some(terms) = index.elements.get(element) {
                roots.extend(index.tuple(*terms));
            }
        }
        roots.extend(guard);
    }
    roots
}

/// Append `theory_symbol/2` facts for the theory terms of `log`.
///
/// Returns the number of facts added.
pub fn extend_with_theory_symbols(log: &mut MetaLog) -> usize {
    let mut index = TheoryIndex::build(log);
    let mut next_id = log.max_id().map_or(0, |id| id + 1);
    let mut seen: HashSet<Symbol> = HashSet::new();
    let mut added = Vec::new();

    let mut stack: Vec<u32> = atom_terms(log, &index);
    stack.reverse();
    while let Some(term) = stack.pop() {
        if let Some(symbol) = index.symbol(term) {
            if seen.insert(symbol.clone()) {
                added.push(MetaFact::TheorySymbol {
                    id: next_id,
                    symbol,
                });
                next_id += 1;
            }
        }
        let mut children = index.children(term);
        children.reverse();
        stack.extend(children);
    }

    let count = added.len();
    for fact in added {
        log.append(fact);
    }
    debug!(count, "theory symbols added");
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reifier::Reifier;
    use metalp_ground::Control;
    use std::sync::mpsc::channel;

    const GRAMMAR: &str = "
#theory theory {
    term { +  : 6, binary, left;
           <? : 5, binary, left;
           <  : 4, unary };
    &tel/0 : term, any;
    &tel2/0 : term, {=}, term, head
}.
";

    fn reified(program: &str) -> MetaLog {
        let mut control = Control::new();
        control.add(program);
        let (tx, rx) = channel();
        control.ground(Some(&tx)).unwrap();
        drop(tx);
        Reifier::new().consume(rx).unwrap()
    }

    fn theory_symbols(log: &MetaLog) -> Vec<(u32, String)> {
        log.iter()
            .filter_map(|fact| match fact {
                MetaFact::TheorySymbol { id, symbol } => Some((*id, symbol.to_string())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_theory_symbols_for_operator_terms() {
        // GIVEN
        let mut log = reified(&format!("{GRAMMAR}&tel {{ a(s) <? b((2,3)) }}."));
        let before = log.max_id().unwrap();

        // WHEN
        let added = extend_with_theory_symbols(&mut log);

        // THEN
        let symbols = theory_symbols(&log);
        assert_eq!(added, symbols.len());
        let names: Vec<&str> = symbols.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(names, vec!["tel", "a(s)", "a", "s", "b((2,3))", "b", "(2,3)", "2", "3"]);
        assert!(symbols.iter().all(|(id, _)| *id > before));
    }

    #[test]
    fn test_theory_symbol_ids_are_fresh_and_consecutive() {
        let mut log = reified(&format!("{GRAMMAR}&tel {{ a(s) <? b((2,3)) }}."));
        let first = log.max_id().unwrap() + 1;
        extend_with_theory_symbols(&mut log);
        let ids: Vec<u32> = theory_symbols(&log).iter().map(|(id, _)| *id).collect();
        let expected: Vec<u32> = (first..first + ids.len() as u32).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_repeated_terms_get_one_entry() {
        let mut log = reified(&format!(
            "{GRAMMAR}&tel {{ f(x) }}.\n&tel {{ f(x) <? f(x) }}."
        ));
        extend_with_theory_symbols(&mut log);
        let names: Vec<String> = theory_symbols(&log).into_iter().map(|(_, s)| s).collect();
        assert_eq!(names, vec!["tel", "f(x)", "f", "x"]);
    }

    #[test]
    fn test_guard_terms_are_walked() {
        let mut log = reified(&format!("{GRAMMAR}&tel2 {{ 1 }} = g(3)."));
        extend_with_theory_symbols(&mut log);
        let names: Vec<String> = theory_symbols(&log).into_iter().map(|(_, s)| s).collect();
        assert_eq!(names, vec!["tel2", "1", "g(3)", "g", "3"]);
    }

    #[test]
    fn test_function_names_get_one_entry() {
        let mut log = reified(&format!("{GRAMMAR}&tel {{ f(x) ; f }}."));
        extend_with_theory_symbols(&mut log);
        let mut names: Vec<String> = theory_symbols(&log).into_iter().map(|(_, s)| s).collect();
        names.sort();
        assert_eq!(names, vec!["f", "f(x)", "tel", "x"]);
    }

    #[test]
    fn test_without_theory_atoms_nothing_is_added() {
        let mut log = reified("a. b :- a.");
        let before = log.len();
        assert_eq!(extend_with_theory_symbols(&mut log), 0);
        assert_eq!(log.len(), before);
    }
}
