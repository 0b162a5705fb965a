//! metalp integration test framework
//!
//! Scenarios name a fixture of programs split into steps and state what each
//! step must produce:
//! - Fixtures are `.lp` files with `%# step_name` markers
//! - Steps run through the extension chain, classic reification or the
//!   full pipeline
//! - Assertions check output lines, regex matches and error kinds

mod assertion;
mod error;
mod loader;
mod runner;
mod scenario;

pub use assertion::{Assertion, AssertionBuilder, Stage};
pub use error::{ScenarioError, ScenarioResult};
pub use loader::Programs;
pub use runner::Runner;
pub use scenario::{fixtures_dir, Scenario, Step};

pub mod prelude {
    pub use crate::{Assertion, AssertionBuilder, Scenario, Stage};
    pub use metalp_pipeline::ErrorKind;
}
