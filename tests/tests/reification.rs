//! Reification into meta-facts and the theory symbol table.

use metalp_pipeline::{Pipeline, PipelineConfig};
use metalp_tests::prelude::*;

pub fn scenario() -> Scenario {
    Scenario::new("reification").programs("reification.lp")
}

mod classic {
    use super::*;

    #[test]
    fn test_facts_and_rules() {
        scenario()
            .step("facts_and_rules", |a| {
                a.classic().text(
                    "atom_tuple(0).\n\
                     atom_tuple(0,1).\n\
                     literal_tuple(1).\n\
                     rule(disjunction(0),normal(1)).\n\
                     atom_tuple(2).\n\
                     atom_tuple(2,2).\n\
                     literal_tuple(3).\n\
                     literal_tuple(3,1).\n\
                     rule(disjunction(2),normal(3)).\n\
                     output(a,1).\n\
                     literal_tuple(4).\n\
                     literal_tuple(4,2).\n\
                     output(b,4).\n",
                )
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_guard_terms_get_symbols() {
        scenario()
            .step("guarded", |a| {
                a.classic()
                    .count(r"^theory_symbol\(\d+,tel2\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,g\(3\)\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,3\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,1\)\.$", 1)
            })
            .run()
            .unwrap();
    }
}

mod theory_symbols {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_each_representable_term_once() {
        scenario()
            .step("theory_terms", |a| {
                a.count(r"^theory_symbol\(\d+,tel\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,a\(s\)\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,s\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,b\(\(2,3\)\)\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,\(2,3\)\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,2\)\.$", 1)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_symbol_ids_are_above_every_other_id() {
        let pipeline = Pipeline::new(PipelineConfig::new().with_clean_output(false));
        let programs = scenario().load_programs().unwrap();
        let output = pipeline
            .classic(&[], programs.get_step("theory_terms"))
            .unwrap();

        let number = regex_lite::Regex::new(r"\d+").unwrap();
        let symbol_ids: Vec<u32> = output
            .lines()
            .filter(|line| line.starts_with("theory_symbol("))
            .map(|line| line["theory_symbol(".len()..].split(',').next().unwrap().parse().unwrap())
            .collect();
        let other_max = output
            .lines()
            .filter(|line| !line.starts_with("theory_symbol(") && !line.starts_with("output("))
            .flat_map(|line| number.find_iter(line).map(|m| m.as_str().parse::<u32>().unwrap()))
            .max()
            .unwrap();

        assert!(!symbol_ids.is_empty());
        let first = other_max + 1;
        let expected: Vec<u32> = (first..first + symbol_ids.len() as u32).collect();
        assert_eq!(symbol_ids, expected);
    }
}

mod body_aggregates {
    use super::*;

    #[test]
    fn test_count_bounds_are_sum_rules() {
        scenario()
            .step("count_aggregate", |a| {
                a.classic()
                    .count(r"^weighted_literal_tuple\(\d+\)\.$", 1)
                    .count(r"^weighted_literal_tuple\(\d+,[12],1\)\.$", 2)
                    .count(r"^rule\(disjunction\(\d+\),sum\(\d+,1\)\)\.$", 1)
                    .count(r"^rule\(disjunction\(\d+\),sum\(\d+,2\)\)\.$", 1)
                    .count(r"^output\(q\([012]\),\d+\)\.$", 3)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_sum_rules_survive_filtering() {
        scenario()
            .step("count_aggregate", |a| {
                a.matches(r"^rule\(disjunction\(\d+\),sum\(\d+,2\)\)\.$")
                    .matches(r"^weighted_literal_tuple\(\d+,2,1\)\.$")
                    .matches(r"^output\(q\(2\),\d+\)\.$")
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_conditional_literal_instances() {
        scenario()
            .step("conditional_literal", |a| {
                a.classic()
                    .count(r"^rule\(disjunction\(\d+\),normal\(\d+\)\)\.$", 7)
                    .matches(r"^literal_tuple\(\d+,-1\)\.$")
                    .matches(r"^output\(q,\d+\)\.$")
            })
            .run()
            .unwrap();
    }
}
