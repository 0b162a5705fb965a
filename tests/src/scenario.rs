//! Scenario definitions.

use std::path::PathBuf;

use crate::assertion::{Assertion, AssertionBuilder};
use crate::error::{ScenarioError, ScenarioResult};
use crate::loader::Programs;
use crate::runner::Runner;

/// Directory holding the programs files.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))
}

#[derive(Debug)]
pub struct Step {
    pub name: String,
    pub assertion: Assertion,
}

/// A named sequence of steps over one programs file.
#[derive(Debug)]
pub struct Scenario {
    name: String,
    programs_path: Option<PathBuf>,
    programs: Option<Programs>,
    clean_output: bool,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            programs_path: None,
            programs: None,
            clean_output: true,
            steps: Vec::new(),
        }
    }

    /// Programs file, relative to the fixtures directory.
    pub fn programs(mut self, path: impl Into<PathBuf>) -> Self {
        self.programs_path = Some(fixtures_dir().join(path.into()));
        self
    }

    /// Programs given inline instead of from a file.
    pub fn programs_source(mut self, source: &str) -> ScenarioResult<Self> {
        self.programs = Some(Programs::parse(source)?);
        Ok(self)
    }

    /// Run the pipeline without the clean-output filter.
    pub fn full_output(mut self) -> Self {
        self.clean_output = false;
        self
    }

    pub fn step<F>(mut self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(AssertionBuilder) -> AssertionBuilder,
    {
        self.steps.push(Step {
            name: name.into(),
            assertion: build(AssertionBuilder::new()).build(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn clean_output(&self) -> bool {
        self.clean_output
    }

    pub fn load_programs(&self) -> ScenarioResult<Programs> {
        if let Some(programs) = &self.programs {
            return Ok(programs.clone());
        }
        match &self.programs_path {
            Some(path) => Programs::load(path),
            None => Err(ScenarioError::MissingPrograms),
        }
    }

    pub fn run(&self) -> ScenarioResult<()> {
        Runner::new(self)?.run()
    }
}
