//! Reification stage.

use std::sync::mpsc::channel;

use metalp_ground::Control;
use metalp_reify::{extend_with_theory_symbols, MetaLog, Reifier};
use tracing::{info, info_span};

use crate::error::PipelineResult;

/// Ground `program` and log its meta-facts, theory symbols included.
pub fn reify_program(program: &str, constants: &[String]) -> PipelineResult<MetaLog> {
    let _span = info_span!("reify").entered();

    let mut control = Control::with_constants(constants)?;
    control.add(program);
    let (events, receiver) = channel();
    control.ground(Some(&events))?;
    drop(events);

    let mut log = Reifier::new().consume(receiver)?;
    let added = extend_with_theory_symbols(&mut log);
    info!(facts = log.len(), theory_symbols = added, "program reified");
    Ok(log)
}
