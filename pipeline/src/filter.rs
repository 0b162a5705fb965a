//! Output filtering over the reified program.

use metalp_core::Symbol;
use metalp_extension::{Encodings, Extension};
use metalp_ground::Control;
use metalp_reify::MetaLog;
use tracing::{debug, info_span};

use crate::error::{FilterError, PipelineResult};

/// Encoding every filter run loads.
pub const BASE_ENCODING: &str = "base";

/// Solve the meta-facts together with the visibility encodings and return
/// the selected symbols.
///
/// The reified program must have exactly one answer.
pub fn filter_output(
    log: &MetaLog,
    extensions: &[Box<dyn Extension>],
    encodings: &Encodings,
    clean_output: bool,
) -> PipelineResult<Vec<Symbol>> {
    let _span = info_span!("filter", clean_output).entered();

    let mut control = Control::new();
    control.add(log.to_program());
    control.add(encodings.load(BASE_ENCODING)?);
    if clean_output {
        control.add("#show.");
    }
    for extension in extensions {
        extension.extend_grounding(&mut control, encodings)?;
    }

    let mut models = control.solve().map_err(FilterError::Solve)?;
    let model = match models.len() {
        0 => return Err(FilterError::NoModel.into()),
        1 => models.remove(0),
        count => return Err(FilterError::MultipleModels { count }.into()),
    };
    let symbols = model.symbols(!clean_output);
    debug!(symbols = symbols.len(), "filter answer");
    Ok(symbols)
}

/// One `symbol.` per line.
pub fn render_symbols(symbols: &[Symbol]) -> String {
    let mut out = String::new();
    for symbol in symbols {
        out.push_str(&symbol.to_string());
        out.push_str(".\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PipelineError};
    use metalp_reify::MetaFact;

    fn log_of(facts: Vec<MetaFact>) -> MetaLog {
        let mut log = MetaLog::new();
        for fact in facts {
            log.append(fact);
        }
        log
    }

    #[test]
    fn test_clean_output_hides_unshown_facts() {
        let log = log_of(vec![
            MetaFact::AtomTuple(0),
            MetaFact::AtomTupleAtom { tuple: 0, atom: 1 },
            MetaFact::TheoryNumber { term: 1, number: 4 },
        ]);
        let clean = filter_output(&log, &[], &Encodings::builtin(), true).unwrap();
        assert_eq!(render_symbols(&clean), "atom_tuple(0).\natom_tuple(0,1).\n");

        let full = filter_output(&log, &[], &Encodings::builtin(), false).unwrap();
        assert_eq!(
            render_symbols(&full),
            "atom_tuple(0).\natom_tuple(0,1).\ntheory_number(1,4).\n"
        );
    }

    #[test]
    fn test_failing_encoding_is_filter_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("base.lp"), ":- atom_tuple(0).\n").unwrap();
        let log = log_of(vec![MetaFact::AtomTuple(0)]);

        match filter_output(&log, &[], &Encodings::with_dir(dir.path()), true) {
            Err(err @ PipelineError::Filter(FilterError::NoModel)) => {
                assert_eq!(err.kind(), ErrorKind::Filter)
            }
            other => panic!("Expected NoModel, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_encoding_is_resource_error() {
        struct Broken;
        impl Extension for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn encoding(&self) -> Option<&'static str> {
                Some("does_not_exist")
            }
        }

        let extensions: Vec<Box<dyn Extension>> = vec![Box::new(Broken)];
        let err = filter_output(&MetaLog::new(), &extensions, &Encodings::builtin(), true)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
    }
}
