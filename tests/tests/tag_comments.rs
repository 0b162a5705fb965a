//! Tag comments: rewriting and the tag facts they produce.

use metalp_extension::{Extension, TagExtension, TAG_THEORY};
use metalp_tests::prelude::*;

pub fn scenario() -> Scenario {
    Scenario::new("tag_comments").programs("tagging.lp")
}

mod rewriting {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rule_tags_attach_to_the_next_rule() {
        let output = TagExtension::new()
            .transform(&[], Some("% @a\n% @b\n% @a\nr(1).\ns(2).\n"))
            .unwrap();
        let expected = format!(
            "r(1) :- &tag_rule(\"r(1).\"), &tag_rule(a), &tag_rule(b).\n\
             s(2) :- &tag_rule(\"s(2).\").\n{}",
            TAG_THEORY
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_chain_rewrites_each_step() {
        scenario()
            .step("rule_tags", |a| {
                a.transformed()
                    .contains("r(1) :- &tag_rule(\"r(1).\"), &tag_rule(a), &tag_rule(b).")
                    .contains("s(2) :- &tag_rule(\"s(2).\").")
                    .count("^#theory tag", 1)
            })
            .step("atom_tag", |a| {
                a.transformed()
                    .contains(":- not &tag_atom(found,reachable(X)), reachable(X), edge(X,Y).")
                    .contains("edge(1,2) :- &tag_rule(\"edge(1,2).\").")
                    .lacks("% @found :: reachable(X) : edge(X,Y)")
            })
            .step("stacked_atom_tags", |a| {
                a.transformed()
                    .matches(r"^:- not &tag_atom\(first,p\(1\)\), p\(1\)\.$")
                    .matches(r"^:- not &tag_atom\(second,q\(2\)\), q\(2\), p\(1\)\.$")
                    .count("^% @", 0)
            })
            .step("quoted", |a| {
                a.transformed()
                    .contains("p(\"x\") :- &tag_rule(\"p('x').\").")
            })
            .step("plain_comment", |a| {
                a.transformed()
                    .contains("% a note, not a tag")
                    .contains("q :- &tag_rule(\"q.\").")
            })
            .run()
            .unwrap();
    }
}

mod malformed {
    use super::*;

    #[test]
    fn test_malformed_tags_are_tag_syntax_errors() {
        scenario()
            .step("malformed_atom_tag", |a| {
                a.error(ErrorKind::TagSyntax).error_contains("% @bad ::: garbage(")
            })
            .step("malformed_rule_tag", |a| a.error(ErrorKind::TagSyntax))
            .step("malformed_generated_rule", |a| {
                a.error(ErrorKind::TagSyntax)
                    .error_contains("(rule `:- not &tag_atom(bad(,p), p.`)")
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_malformed_tags_fail_the_transform_stage_too() {
        scenario()
            .step("malformed_atom_tag", |a| a.transformed().error(ErrorKind::TagSyntax))
            .run()
            .unwrap();
    }
}

mod tag_facts {
    use super::*;

    #[test]
    fn test_rule_tags_reach_the_output() {
        scenario()
            .step("rule_tags", |a| {
                // One fingerprint per rule plus the two distinct tags on r(1).
                a.count(r"^rule_tag\(\d+,\d+\)\.$", 4)
                    .count(r"^theory_symbol\(\d+,a\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,b\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,tag_rule\)\.$", 1)
                    .matches(r#"^theory_symbol\(\d+,"r\(1\)\."\)\.$"#)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_atom_tag_reaches_the_output() {
        scenario()
            .step("atom_tag", |a| {
                a.count(r"^atom_tag\(\d+,\d+,\d+\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,found\)\.$", 1)
                    .count(r"^theory_symbol\(\d+,reachable\(1\)\)\.$", 1)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_tag_literals_are_hidden_from_clean_output() {
        scenario()
            .step("rule_tags", |a| {
                // Only the output conditions of r(1) and s(2) remain.
                a.count(r"^literal_tuple\(\d+,\d+\)\.$", 2)
                    .count(r"^rule\(disjunction\(\d+\),normal\(\d+\)\)\.$", 2)
                    .matches(r"^output\(r\(1\),\d+\)\.$")
            })
            .run()
            .unwrap();
    }
}
