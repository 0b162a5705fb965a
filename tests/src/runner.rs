//! Scenario runner.

use metalp_extension::default_extensions;
use metalp_pipeline::{run_chain, Pipeline, PipelineConfig};

use crate::assertion::Stage;
use crate::error::{ScenarioError, ScenarioResult};
use crate::loader::Programs;
use crate::scenario::Scenario;

/// Runs a scenario's steps, each on a fresh pipeline.
pub struct Runner<'s> {
    scenario: &'s Scenario,
    programs: Programs,
}

impl<'s> Runner<'s> {
    pub fn new(scenario: &'s Scenario) -> ScenarioResult<Self> {
        let programs = scenario.load_programs()?;
        Ok(Self { scenario, programs })
    }

    pub fn run(&self) -> ScenarioResult<()> {
        for step in self.scenario.steps() {
            let program = self
                .programs
                .get_step(&step.name)
                .ok_or_else(|| ScenarioError::step_not_found(&step.name))?;

            let config = PipelineConfig::new()
                .with_constants(self.programs.constants(&step.name).iter().cloned())
                .with_clean_output(self.scenario.clean_output());

            let result = match step.assertion.stage {
                Stage::Transform => run_chain(&default_extensions(), &[], Some(program)),
                Stage::Classic => Pipeline::new(config).classic(&[], Some(program)),
                Stage::Output => Pipeline::new(config).run(&[], Some(program)),
            };

            step.assertion.verify(&step.name, &result)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::scenario::Scenario;

    #[test]
    fn test_runner_with_inline_programs() {
        let scenario = Scenario::new("inline")
            .programs_source("%# fact\na.\n%# broken\np( .\n")
            .unwrap()
            .step("fact", |a| a.classic().matches(r"^output\(a,\d+\)\.$"))
            .step("broken", |a| a.error(metalp_pipeline::ErrorKind::Syntax));

        scenario.run().unwrap();
    }

    #[test]
    fn test_unknown_step() {
        let scenario = Scenario::new("missing")
            .programs_source("%# a\na.\n")
            .unwrap()
            .step("b", |a| a.lines(0));
        assert!(scenario.run().is_err());
    }
}
