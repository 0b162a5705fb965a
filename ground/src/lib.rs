//! metalp ground
//!
//! Grounding and solving for the metalp pipeline:
//! - Program preparation (parts, constants, safety, theory declarations)
//! - Instantiation over possibly true atoms with structural event output
//! - Body aggregates and conditional literals through auxiliary atoms
//! - Stratified evaluation of normal programs into a single model

mod aggregate;
mod control;
mod error;
mod eval;
mod event;
mod grounder;
mod plan;
mod program;
mod solve;
mod store;
mod theory;

pub use control::{parse_constant, Control};
pub use error::{GroundError, GroundResult};
pub use event::{CompoundKind, EventSender, GroundEvent, TruthValue};
pub use solve::Model;
