//! Pipeline error types.

use std::fmt;

use metalp_extension::ExtensionError;
use metalp_ground::GroundError;
use metalp_reify::ReifyError;
use thiserror::Error;

/// Kind of a pipeline failure. Every kind is fatal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    TagSyntax,
    Grounding,
    Filter,
    Resource,
    Io,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::TagSyntax => "TagSyntaxError",
            ErrorKind::Grounding => "GroundingError",
            ErrorKind::Filter => "FilterError",
            ErrorKind::Resource => "ResourceError",
            ErrorKind::Io => "IoError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures of the output filter's solve.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("the reified program has no answer")]
    NoModel,

    #[error("the reified program has {count} answers, expected exactly one")]
    MultipleModels { count: usize },

    #[error("{0}")]
    Solve(GroundError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extension(#[from] ExtensionError),

    #[error("grounding failed: {0}")]
    Grounding(#[from] GroundError),

    #[error("reification failed: {0}")]
    Reify(#[from] ReifyError),

    #[error("filter failed: {0}")]
    Filter(#[from] FilterError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Extension(e) => match e {
                ExtensionError::Syntax { .. } => ErrorKind::Syntax,
                ExtensionError::TagSyntax { .. } => ErrorKind::TagSyntax,
                ExtensionError::Io { .. } => ErrorKind::Io,
                ExtensionError::Resource { .. } | ExtensionError::Pattern(_) => {
                    ErrorKind::Resource
                }
            },
            PipelineError::Grounding(GroundError::Parse(_)) => ErrorKind::Syntax,
            PipelineError::Grounding(_) | PipelineError::Reify(_) => ErrorKind::Grounding,
            PipelineError::Filter(_) => ErrorKind::Filter,
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
