//! Output filtering, constants and error reporting.

use metalp_pipeline::{Pipeline, PipelineConfig, CLEAN_DUMP, FULL_DUMP};
use metalp_tests::prelude::*;

pub fn scenario() -> Scenario {
    Scenario::new("output_filter").programs("filtering.lp")
}

fn step_program(name: &str) -> String {
    let programs = scenario().load_programs().unwrap();
    programs.get_step(name).unwrap().to_string()
}

mod filtering {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_show_directives_select_outputs() {
        scenario()
            .step("shown", |a| {
                a.count(r"^output\(b,\d+\)\.$", 1)
                    .count(r"^output\(a,\d+\)\.$", 0)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_full_output_keeps_theory_structure() {
        scenario()
            .full_output()
            .step("shown", |a| {
                a.matches(r"^theory_atom\(\d+,\d+,\d+\)\.$")
                    .matches(r"^literal_tuple\(\d+,\d+\)\.$")
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_clean_output_is_a_subset_of_full_output() {
        let program = step_program("shown");
        let clean = Pipeline::new(PipelineConfig::new())
            .run(&[], Some(&program))
            .unwrap();
        let full = Pipeline::new(PipelineConfig::new().with_clean_output(false))
            .run(&[], Some(&program))
            .unwrap();

        let full_lines: Vec<&str> = full.lines().collect();
        for line in clean.lines() {
            assert!(full_lines.contains(&line), "missing from full output: {}", line);
        }
    }

    #[test]
    fn test_runs_are_deterministic() {
        let program = step_program("shown");
        let pipeline = Pipeline::new(PipelineConfig::new());
        let first = pipeline.run(&[], Some(&program)).unwrap();
        let second = pipeline.run(&[], Some(&program)).unwrap();
        assert_eq!(first, second);
    }
}

mod constants {
    use super::*;

    #[test]
    fn test_constants_are_substituted() {
        scenario()
            .step("constants", |a| a.count(r"^output\(p\(3\),\d+\)\.$", 1))
            .run()
            .unwrap();
    }
}

mod errors {
    use super::*;

    #[test]
    fn test_error_kinds() {
        scenario()
            .step("unsafe", |a| a.error(ErrorKind::Grounding))
            .step("syntax", |a| a.error(ErrorKind::Syntax))
            .run()
            .unwrap();
    }

    #[test]
    fn test_classic_mode_reports_the_same_kinds() {
        scenario()
            .step("unsafe", |a| a.classic().error(ErrorKind::Grounding))
            .step("syntax", |a| a.classic().error(ErrorKind::Syntax))
            .run()
            .unwrap();
    }
}

mod dumps {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dumps_match_the_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let program = step_program("shown");

        let output = Pipeline::new(PipelineConfig::new().with_dump_dir(dir.path()))
            .run(&[], Some(&program))
            .unwrap();
        let full = Pipeline::new(PipelineConfig::new().with_clean_output(false))
            .run(&[], Some(&program))
            .unwrap();

        let clean_dump = std::fs::read_to_string(dir.path().join(CLEAN_DUMP)).unwrap();
        assert_eq!(clean_dump, output);

        // Every reified fact is true in the unfiltered model.
        let full_dump = std::fs::read_to_string(dir.path().join(FULL_DUMP)).unwrap();
        let full_lines: Vec<&str> = full.lines().collect();
        for line in full_dump.lines() {
            assert!(full_lines.contains(&line), "missing from full output: {}", line);
        }
    }

    #[test]
    fn test_failed_run_writes_no_dump() {
        let dir = tempfile::tempdir().unwrap();
        let program = step_program("syntax");
        let err = Pipeline::new(PipelineConfig::new().with_dump_dir(dir.path()))
            .run(&[], Some(&program))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert!(!dir.path().join(FULL_DUMP).exists());
        assert!(!dir.path().join(CLEAN_DUMP).exists());
    }
}
