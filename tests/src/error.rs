//! Scenario error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid programs file {origin}: {message}")]
    ProgramsParse { origin: String, message: String },

    #[error("scenario has no programs file")]
    MissingPrograms,

    #[error("step not found: {name}")]
    StepNotFound { name: String },

    #[error("step '{step}' failed: {message}")]
    AssertionFailed { step: String, message: String },
}

impl ScenarioError {
    pub fn file_read(path: &Path, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn programs_parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProgramsParse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn step_not_found(name: impl Into<String>) -> Self {
        Self::StepNotFound { name: name.into() }
    }

    pub fn assertion_failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            step: step.into(),
            message: message.into(),
        }
    }
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
