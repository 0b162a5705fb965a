//! Loader for programs files.
//!
//! A programs file holds one program per step. `%# step_name` starts a step;
//! `%#const name=value` inside a step adds a constant definition for it.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ScenarioError, ScenarioResult};

#[derive(Debug, Clone, Default)]
pub struct Programs {
    /// Step name to program text.
    pub steps: HashMap<String, String>,
    /// Steps in order of appearance.
    pub step_order: Vec<String>,
    /// Constant definitions per step.
    pub constants: HashMap<String, Vec<String>>,
}

impl Programs {
    pub fn parse(source: &str) -> ScenarioResult<Self> {
        Self::parse_named(source, "<inline>")
    }

    fn parse_named(source: &str, origin: &str) -> ScenarioResult<Self> {
        let mut programs = Programs::default();
        let mut current: Option<String> = None;

        for line in source.lines() {
            let trimmed = line.trim();

            if let Some(definition) = trimmed.strip_prefix("%#const ") {
                let step = current.as_ref().ok_or_else(|| {
                    ScenarioError::programs_parse(origin, "%#const before the first step")
                })?;
                programs
                    .constants
                    .entry(step.clone())
                    .or_default()
                    .push(definition.trim().to_string());
                continue;
            }

            if let Some(name) = trimmed.strip_prefix("%#") {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(ScenarioError::programs_parse(
                        origin,
                        "empty step name after %#",
                    ));
                }
                if programs.steps.contains_key(&name) {
                    return Err(ScenarioError::programs_parse(
                        origin,
                        format!("duplicate step '{}'", name),
                    ));
                }
                programs.steps.insert(name.clone(), String::new());
                programs.step_order.push(name.clone());
                current = Some(name);
                continue;
            }

            // Lines before the first marker are file-level notes.
            if let Some(step) = &current {
                if let Some(text) = programs.steps.get_mut(step) {
                    text.push_str(line);
                    text.push('\n');
                }
            }
        }

        Ok(programs)
    }

    pub fn load(path: &Path) -> ScenarioResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| ScenarioError::file_read(path, e))?;
        Self::parse_named(&source, &path.display().to_string())
    }

    pub fn get_step(&self, name: &str) -> Option<&str> {
        self.steps.get(name).map(String::as_str)
    }

    pub fn constants(&self, name: &str) -> &[String] {
        self.constants.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn step_names(&self) -> &[String] {
        &self.step_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let source = "\
% file notes
%# first
a.
% @tag
b.

%# second
%#const n=3
p(n).
";
        let programs = Programs::parse(source).unwrap();
        assert_eq!(programs.step_names(), &["first", "second"]);
        assert_eq!(programs.get_step("first"), Some("a.\n% @tag\nb.\n\n"));
        assert_eq!(programs.get_step("second"), Some("p(n).\n"));
        assert_eq!(programs.constants("second"), &["n=3".to_string()]);
        assert!(programs.constants("first").is_empty());
    }

    #[test]
    fn test_tag_comments_are_not_markers() {
        let programs = Programs::parse("%# only\n% @t :: p(1)\n").unwrap();
        assert_eq!(programs.get_step("only"), Some("% @t :: p(1)\n"));
    }

    #[test]
    fn test_empty_step_name() {
        match Programs::parse("%#\na.") {
            Err(ScenarioError::ProgramsParse { message, .. }) => {
                assert!(message.contains("empty step name"))
            }
            other => panic!("Expected ProgramsParse error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_step() {
        assert!(Programs::parse("%# a\nx.\n%# a\ny.").is_err());
    }
}
