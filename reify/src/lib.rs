//! metalp reify
//!
//! Compiles a ground program into facts describing its own structure:
//! - The meta-fact vocabulary and its canonical text
//! - An append-only log of facts in arrival order
//! - The reifier consuming grounding events from a channel
//! - The theory-symbol patch naming terms found only in theory atoms

mod error;
mod fact;
mod log;
mod patch;
mod reifier;

pub use error::{ReifyError, ReifyResult};
pub use fact::{MetaFact, RuleBody, RuleHead, SequenceType};
pub use log::MetaLog;
pub use patch::extend_with_theory_symbols;
pub use reifier::Reifier;
