//! The grounding and solving entry point.

use metalp_parser::{parse_program, parse_term, Term};
use tracing::{debug, info_span};

use crate::error::{GroundError, GroundResult};
use crate::event::EventSender;
use crate::grounder::Grounder;
use crate::program::Program;
use crate::solve::{solve, Model};

/// Collects program text, grounds it and computes models.
///
/// ```ignore
/// let mut ctl = Control::with_constants(["n=3"])?;
/// ctl.add("p(1..n).");
/// let (tx, rx) = std::sync::mpsc::channel();
/// ctl.ground(Some(&tx))?;
/// let models = ctl.solve()?;
/// ```
#[derive(Debug, Default)]
pub struct Control {
    sources: Vec<String>,
    constants: Vec<(String, Term)>,
    program: Option<Program>,
}

impl Control {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a control with `name=value` constant definitions.
    pub fn with_constants<I, S>(definitions: I) -> GroundResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let constants = definitions
            .into_iter()
            .map(|d| parse_constant(d.as_ref()))
            .collect::<GroundResult<Vec<_>>>()?;
        Ok(Self {
            constants,
            ..Self::default()
        })
    }

    /// Append program text to the `base` part.
    pub fn add(&mut self, source: impl Into<String>) {
        self.sources.push(source.into());
        self.program = None;
    }

    /// Prepare the program; with an observer, ground it and stream the
    /// structural events.
    pub fn ground(&mut self, observer: Option<&EventSender>) -> GroundResult<()> {
        let _span = info_span!("ground", sources = self.sources.len()).entered();
        let mut statements = Vec::new();
        for source in &self.sources {
            statements.extend(parse_program(source)?);
        }
        let program = Program::prepare(statements, &self.constants)?;
        debug!(rules = program.rules.len(), "program prepared");

        if let Some(sink) = observer {
            Grounder::new(&program, sink).run()?;
        }
        self.program = Some(program);
        Ok(())
    }

    /// All stable models of the program.
    pub fn solve(&mut self) -> GroundResult<Vec<Model>> {
        if self.program.is_none() {
            self.ground(None)?;
        }
        match &self.program {
            Some(program) => {
                let _span = info_span!("solve").entered();
                solve(program)
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Parse `name=value`.
pub fn parse_constant(definition: &str) -> GroundResult<(String, Term)> {
    let (name, value) = definition
        .split_once('=')
        .ok_or_else(|| GroundError::invalid_constant(definition, "expected name=value"))?;
    let name = name.trim();
    let valid_name = name.starts_with(|c: char| c.is_ascii_lowercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name {
        return Err(GroundError::invalid_constant(
            definition,
            format!("'{name}' is not a constant name"),
        ));
    }
    let value = parse_term(value.trim())
        .map_err(|e| GroundError::invalid_constant(definition, e.to_string()))?;
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CompoundKind, GroundEvent, TruthValue};
    use metalp_core::{AtomId, Lit, Symbol};
    use std::sync::mpsc;

    fn events(text: &str) -> Vec<GroundEvent> {
        let mut ctl = Control::new();
        ctl.add(text);
        let (tx, rx) = mpsc::channel();
        ctl.ground(Some(&tx)).unwrap();
        drop(tx);
        rx.into_iter().collect()
    }

    fn model(text: &str) -> Vec<Model> {
        let mut ctl = Control::new();
        ctl.add(text);
        ctl.solve().unwrap()
    }

    fn atom(id: u32) -> AtomId {
        AtomId::new(id)
    }

    fn c(name: &str) -> Symbol {
        Symbol::constant(name)
    }

    #[test]
    fn test_facts_and_rules() {
        let events = events("a. b :- a, not c.");
        assert_eq!(
            events,
            vec![
                GroundEvent::Rule {
                    choice: false,
                    head: vec![atom(1)],
                    body: vec![],
                },
                GroundEvent::Rule {
                    choice: false,
                    head: vec![atom(2)],
                    body: vec![Lit::positive(atom(1))],
                },
                GroundEvent::Output {
                    symbol: c("a"),
                    condition: vec![],
                },
                GroundEvent::Output {
                    symbol: c("b"),
                    condition: vec![Lit::positive(atom(2))],
                },
            ]
        );
    }

    #[test]
    fn test_choice_with_bounds() {
        let events = events("1 { a; b } 1.");
        assert_eq!(
            events[0],
            GroundEvent::Rule {
                choice: true,
                head: vec![atom(1), atom(2)],
                body: vec![],
            }
        );
        assert_eq!(
            events[1],
            GroundEvent::WeightRule {
                choice: false,
                head: vec![atom(3)],
                lower: 1,
                body: vec![(Lit::positive(atom(1)), 1), (Lit::positive(atom(2)), 1)],
            }
        );
        assert_eq!(
            events[2],
            GroundEvent::Rule {
                choice: false,
                head: vec![],
                body: vec![Lit::negative(atom(3))],
            }
        );
        assert!(matches!(
            events[3],
            GroundEvent::WeightRule { lower: 2, .. }
        ));
    }

    #[test]
    fn test_theory_events_precede_their_rule() {
        let events = events(
            "#theory t { term { }; &x/1 : term, any }.
             a. b :- &x(a) { 1, f(a) : a }.",
        );
        let kinds: Vec<&str> = events
            .iter()
            .map(|e| match e {
                GroundEvent::Rule { .. } => "rule",
                GroundEvent::TheoryNumber { .. } => "number",
                GroundEvent::TheoryString { .. } => "string",
                GroundEvent::TheoryCompound { .. } => "compound",
                GroundEvent::TheoryElement { .. } => "element",
                GroundEvent::TheoryAtom { .. } => "atom",
                GroundEvent::Output { .. } => "output",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "rule", "string", "string", "compound", "number", "string", "compound",
                "element", "atom", "rule", "output", "output"
            ]
        );
        match &events[3] {
            GroundEvent::TheoryCompound { kind, args, .. } => {
                assert_eq!(*kind, CompoundKind::Function(0));
                assert_eq!(args, &vec![1]);
            }
            other => panic!("Expected TheoryCompound, got {:?}", other),
        }
        match &events[7] {
            GroundEvent::TheoryElement { terms, condition, .. } => {
                assert_eq!(terms, &vec![3, 5]);
                assert_eq!(condition, &vec![Lit::positive(atom(1))]);
            }
            other => panic!("Expected TheoryElement, got {:?}", other),
        }
        match &events[9] {
            GroundEvent::Rule { body, .. } => assert_eq!(body, &vec![Lit::positive(atom(3))]),
            other => panic!("Expected Rule, got {:?}", other),
        }
    }

    #[test]
    fn test_impossible_negation_is_dropped() {
        let events = events("a :- not b.");
        assert_eq!(
            events[0],
            GroundEvent::Rule {
                choice: false,
                head: vec![atom(1)],
                body: vec![],
            }
        );
    }

    #[test]
    fn test_show_restricts_outputs() {
        let events = events("p(1). q(2). #show p/1. #show r : q(2).");
        let outputs: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                GroundEvent::Output { symbol, .. } => Some(symbol.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(outputs, vec!["p(1)", "r"]);
    }

    #[test]
    fn test_externals() {
        let events = events("#external e. [free]");
        assert!(events.contains(&GroundEvent::External {
            atom: atom(1),
            value: TruthValue::Free,
        }));
    }

    #[test]
    fn test_stratified_model() {
        let models = model(
            "edge(1,2). edge(2,3).
             path(X,Y) :- edge(X,Y).
             path(X,Z) :- path(X,Y), edge(Y,Z).
             reached(Y) :- path(_,Y).
             source(X) :- edge(X,_), not reached(X).",
        );
        assert_eq!(models.len(), 1);
        let shown: Vec<String> = models[0].symbols(true).iter().map(|s| s.to_string()).collect();
        assert_eq!(
            shown,
            vec![
                "edge(1,2)",
                "edge(2,3)",
                "path(1,2)",
                "path(2,3)",
                "path(1,3)",
                "reached(2)",
                "reached(3)",
                "source(1)"
            ]
        );
    }

    #[test]
    fn test_constraint_removes_model() {
        assert!(model("a. :- a.").is_empty());
    }

    #[test]
    fn test_shown_symbols() {
        let models = model("a. b. #show a/0. #show f(1) : b.");
        assert_eq!(
            models[0].symbols(false),
            vec![c("a"), Symbol::function("f", vec![Symbol::number(1)])]
        );
        assert_eq!(models[0].symbols(true).len(), 3);
    }

    #[test]
    fn test_unstratified_is_rejected() {
        let mut ctl = Control::new();
        ctl.add("a :- not b. b :- not a.");
        assert!(matches!(ctl.solve(), Err(GroundError::Unsupported { .. })));
    }

    #[test]
    fn test_count_assignment_events() {
        let events = events("p(1). p(2). q(N) :- N = #count { X : p(X) }.");
        let count = |lower| GroundEvent::WeightRule {
            choice: false,
            head: vec![atom(if lower == 1 { 6 } else { 7 })],
            lower,
            body: vec![(Lit::positive(atom(1)), 1), (Lit::positive(atom(2)), 1)],
        };
        let rule = |head, body| GroundEvent::Rule {
            choice: false,
            head: vec![atom(head)],
            body,
        };
        assert_eq!(
            events[2..7].to_vec(),
            vec![
                count(1),
                rule(3, vec![Lit::negative(atom(6))]),
                count(2),
                rule(4, vec![Lit::positive(atom(6)), Lit::negative(atom(7))]),
                rule(5, vec![Lit::positive(atom(7))]),
            ]
        );
    }

    #[test]
    fn test_count_assignment_model() {
        let models = model("p(1). p(2). q(N) :- N = #count { X : p(X) }.");
        let atoms: Vec<String> = models[0].atoms().iter().map(|s| s.to_string()).collect();
        assert_eq!(atoms, vec!["p(1)", "p(2)", "q(2)"]);
    }

    #[test]
    fn test_conditional_literal_events() {
        let events = events("p(1). p(2). q :- p(X) : p(X).");
        let rule = |head: Vec<u32>, body| GroundEvent::Rule {
            choice: false,
            head: head.into_iter().map(atom).collect(),
            body,
        };
        for expected in [
            rule(vec![4], vec![Lit::positive(atom(1))]),
            rule(vec![4], vec![Lit::negative(atom(1))]),
            rule(vec![5], vec![Lit::positive(atom(2))]),
            rule(vec![5], vec![Lit::negative(atom(2))]),
            rule(vec![3], vec![Lit::positive(atom(4)), Lit::positive(atom(5))]),
        ] {
            assert!(events.contains(&expected), "missing {:?}", expected);
        }

        let models = model("p(1). p(2). r(1). q :- p(X) : r(X). s :- p(X) : t(X). u :- r(X) : p(X).");
        let atoms: Vec<String> = models[0].atoms().iter().map(|s| s.to_string()).collect();
        assert_eq!(atoms, vec!["p(1)", "p(2)", "r(1)", "q", "s"]);
    }

    #[test]
    fn test_sum_and_min_models() {
        let models = model(
            "w(a,3). w(b,-1).
             big :- #sum { W,K : w(K,W) } >= 2.
             huge :- #sum { W,K : w(K,W) } > 2.
             positive(S) :- S = #sum+ { W,K : w(K,W) }.
             low(M) :- M = #min { W : w(_,W) }.
             high(M) :- #max { W : w(_,W) } = M.
             none :- #max { W : w(c,W) } = #inf.",
        );
        let atoms: Vec<String> = models[0].atoms().iter().map(|s| s.to_string()).collect();
        for expected in ["big", "positive(3)", "low(-1)", "high(3)", "none"] {
            assert!(atoms.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(!atoms.contains(&"huge".to_string()));
        assert!(!atoms.contains(&"low(3)".to_string()));
    }

    #[test]
    fn test_sum_bounds_become_weight_rules() {
        let events = events("{ a; b; c }. ok :- 2 <= #sum { 2,a : a; 1,b : b; -1,c : c } <= 2.");
        let weights: Vec<(i64, usize)> = events
            .iter()
            .filter_map(|e| match e {
                GroundEvent::WeightRule { lower, body, .. } => Some((*lower, body.len())),
                _ => None,
            })
            .collect();
        // Lower 2 and beyond 3, each with `c` moved to `not c` at weight 1.
        assert_eq!(weights, vec![(3, 3), (4, 3)]);
    }

    #[test]
    fn test_aggregate_constraint() {
        assert!(model("p(1). p(2). :- #count { X : p(X) } > 1.").is_empty());
        assert_eq!(model("p(1). :- #count { X : p(X) } > 1.").len(), 1);
        assert_eq!(model("p(1). :- not #count { X : p(X) } = 1.").len(), 1);
    }

    #[test]
    fn test_recursion_through_aggregate_is_rejected() {
        let mut ctl = Control::new();
        ctl.add("p :- #count { : p } = 0.");
        assert!(matches!(ctl.solve(), Err(GroundError::Unsupported { .. })));
    }

    #[test]
    fn test_constants_from_arguments() {
        let mut ctl = Control::with_constants(["n=2"]).unwrap();
        ctl.add("p(1..n).");
        let models = ctl.solve().unwrap();
        assert_eq!(models[0].atoms().len(), 2);

        assert!(matches!(
            Control::with_constants(["N=2"]),
            Err(GroundError::InvalidConstant { .. })
        ));
        assert!(matches!(
            Control::with_constants(["n"]),
            Err(GroundError::InvalidConstant { .. })
        ));
    }
}
