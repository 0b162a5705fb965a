//! Reification error types.

use thiserror::Error;

/// Errors raised while converting grounding events.
#[derive(Debug, Error)]
pub enum ReifyError {
    #[error("theory term {id} referenced before it was defined")]
    UnknownTheoryTerm { id: u32 },

    #[error("theory element {id} referenced before it was defined")]
    UnknownTheoryElement { id: u32 },
}

impl ReifyError {
    pub fn unknown_term(id: u32) -> Self {
        Self::UnknownTheoryTerm { id }
    }

    pub fn unknown_element(id: u32) -> Self {
        Self::UnknownTheoryElement { id }
    }
}

/// Result type for reification.
pub type ReifyResult<T> = Result<T, ReifyError>;
