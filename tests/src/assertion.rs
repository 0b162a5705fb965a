//! Assertion types and builders for verifying step results.

use metalp_pipeline::{ErrorKind, PipelineError};
use regex_lite::Regex;

use crate::error::{ScenarioError, ScenarioResult};

/// What a step runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    /// The extension chain only; output is the rewritten program.
    Transform,
    /// Reification without extensions or filtering.
    Classic,
    /// The full pipeline.
    #[default]
    Output,
}

/// A complete assertion for a step result.
#[derive(Debug, Default)]
pub struct Assertion {
    pub stage: Stage,

    // Output assertions
    pub text: Option<String>,
    pub lines: Option<usize>,
    pub contains: Vec<String>,
    pub lacks: Vec<String>,
    pub matches: Vec<String>,
    pub match_counts: Vec<(String, usize)>,

    // Error assertions
    pub error: Option<ErrorKind>,
    pub error_contains: Option<String>,
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify the assertion against a step result.
    pub fn verify(&self, step: &str, result: &Result<String, PipelineError>) -> ScenarioResult<()> {
        let fail = |message: String| ScenarioError::assertion_failed(step, message);

        if self.error.is_some() || self.error_contains.is_some() {
            let err = match result {
                Err(err) => err,
                Ok(_) => return Err(fail("expected an error, but step succeeded".to_string())),
            };
            if let Some(kind) = self.error {
                if err.kind() != kind {
                    return Err(fail(format!("expected {}, got {}: {}", kind, err.kind(), err)));
                }
            }
            if let Some(fragment) = &self.error_contains {
                if !err.to_string().contains(fragment.as_str()) {
                    return Err(fail(format!(
                        "expected error containing '{}', got: {}",
                        fragment, err
                    )));
                }
            }
            return Ok(());
        }

        let output = result
            .as_ref()
            .map_err(|err| fail(format!("step failed with {}: {}", err.kind(), err)))?;
        let lines: Vec<&str> = output.lines().collect();

        if let Some(expected) = &self.text {
            if output != expected {
                return Err(fail(format!(
                    "output differs\n--- expected\n{}--- actual\n{}",
                    expected, output
                )));
            }
        }

        if let Some(n) = self.lines {
            if lines.len() != n {
                return Err(fail(format!("expected {} lines, got {}", n, lines.len())));
            }
        }

        for line in &self.contains {
            if !lines.contains(&line.as_str()) {
                return Err(fail(format!("missing line '{}'", line)));
            }
        }

        for line in &self.lacks {
            if lines.contains(&line.as_str()) {
                return Err(fail(format!("unexpected line '{}'", line)));
            }
        }

        for pattern in &self.matches {
            let re = compile(step, pattern)?;
            if !lines.iter().any(|line| re.is_match(line)) {
                return Err(fail(format!("no line matches '{}'", pattern)));
            }
        }

        for (pattern, expected) in &self.match_counts {
            let re = compile(step, pattern)?;
            let count = lines.iter().filter(|line| re.is_match(line)).count();
            if count != *expected {
                return Err(fail(format!(
                    "expected {} lines matching '{}', got {}",
                    expected, pattern, count
                )));
            }
        }

        Ok(())
    }
}

fn compile(step: &str, pattern: &str) -> ScenarioResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        ScenarioError::assertion_failed(step, format!("invalid regex pattern: {}", e))
    })
}

/// Builder for fluent assertion construction.
#[derive(Debug, Default)]
pub struct AssertionBuilder {
    assertion: Assertion,
}

impl AssertionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Assertion {
        self.assertion
    }

    // ========== Stages ==========

    /// Check the rewritten program instead of the pipeline output.
    pub fn transformed(mut self) -> Self {
        self.assertion.stage = Stage::Transform;
        self
    }

    /// Check plain reification output.
    pub fn classic(mut self) -> Self {
        self.assertion.stage = Stage::Classic;
        self
    }

    // ========== Output assertions ==========

    /// Assert the exact output text.
    pub fn text(mut self, expected: impl Into<String>) -> Self {
        self.assertion.text = Some(expected.into());
        self
    }

    pub fn lines(mut self, n: usize) -> Self {
        self.assertion.lines = Some(n);
        self
    }

    /// Assert that a line equals `line`.
    pub fn contains(mut self, line: impl Into<String>) -> Self {
        self.assertion.contains.push(line.into());
        self
    }

    /// Assert that no line equals `line`.
    pub fn lacks(mut self, line: impl Into<String>) -> Self {
        self.assertion.lacks.push(line.into());
        self
    }

    /// Assert that some line matches the regex.
    pub fn matches(mut self, pattern: impl Into<String>) -> Self {
        self.assertion.matches.push(pattern.into());
        self
    }

    /// Assert how many lines match the regex.
    pub fn count(mut self, pattern: impl Into<String>, n: usize) -> Self {
        self.assertion.match_counts.push((pattern.into(), n));
        self
    }

    // ========== Error assertions ==========

    pub fn error(mut self, kind: ErrorKind) -> Self {
        self.assertion.error = Some(kind);
        self
    }

    pub fn error_contains(mut self, fragment: impl Into<String>) -> Self {
        self.assertion.error_contains = Some(fragment.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metalp_pipeline::FilterError;

    fn ok(text: &str) -> Result<String, PipelineError> {
        Ok(text.to_string())
    }

    #[test]
    fn test_line_assertions() {
        let assertion = AssertionBuilder::new()
            .lines(3)
            .contains("b(2).")
            .lacks("c.")
            .matches(r"^a\(\d\)\.$")
            .count(r"\(\d\)", 2)
            .build();
        assert!(assertion.verify("s", &ok("a(1).\nb(2).\nd.\n")).is_ok());
        assert!(assertion.verify("s", &ok("a(1).\nc.\nd.\n")).is_err());
    }

    #[test]
    fn test_error_kind_assertion() {
        let assertion = AssertionBuilder::new().error(ErrorKind::Filter).build();
        let result = Err(PipelineError::from(FilterError::NoModel));
        assert!(assertion.verify("s", &result).is_ok());

        match assertion.verify("s", &ok("a.\n")) {
            Err(ScenarioError::AssertionFailed { step, .. }) => assert_eq!(step, "s"),
            other => panic!("Expected AssertionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let assertion = AssertionBuilder::new().matches("(").build();
        match assertion.verify("s", &ok("a.\n")) {
            Err(ScenarioError::AssertionFailed { message, .. }) => {
                assert!(message.contains("invalid regex"))
            }
            other => panic!("Expected AssertionFailed, got {:?}", other),
        }
    }
}
