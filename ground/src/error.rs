//! Grounding error types.

use thiserror::Error;

/// Errors raised while preparing, grounding or solving a program.
#[derive(Debug, Error)]
pub enum GroundError {
    /// Program text failed to parse.
    #[error("{0}")]
    Parse(#[from] metalp_parser::ParseError),

    /// Variables not bound by any positive body literal.
    #[error("unsafe variables {variables} in: {statement}")]
    UnsafeVariables { variables: String, statement: String },

    /// Theory atom without a matching `#theory` declaration.
    #[error("undeclared theory atom &{name}/{arity} in: {statement}")]
    UndeclaredTheoryAtom {
        name: String,
        arity: usize,
        statement: String,
    },

    /// Theory atom in a position its declaration forbids.
    #[error("theory atom &{name}/{arity} is declared {declared} and cannot occur in {position} in: {statement}")]
    TheoryAtomPlacement {
        name: String,
        arity: usize,
        declared: &'static str,
        position: &'static str,
        statement: String,
    },

    /// Operator not declared for the term definition in use.
    #[error("undeclared {arity} theory operator '{operator}' for theory term '{term}' in: {statement}")]
    UndeclaredTheoryOperator {
        operator: String,
        arity: &'static str,
        term: String,
        statement: String,
    },

    /// Theory term definition referenced by an atom declaration is missing.
    #[error("undeclared theory term '{term}' in: {statement}")]
    UndeclaredTheoryTerm { term: String, statement: String },

    /// Malformed `name=value` constant.
    #[error("invalid constant definition '{definition}': {message}")]
    InvalidConstant { definition: String, message: String },

    /// Construct outside what the grounder or solver handles.
    #[error("unsupported: {message}")]
    Unsupported { message: String },

    /// The event consumer went away mid-grounding.
    #[error("grounding observer disconnected")]
    ObserverDisconnected,
}

impl GroundError {
    pub fn unsafe_variables(variables: &[String], statement: impl Into<String>) -> Self {
        Self::UnsafeVariables {
            variables: variables.join(", "),
            statement: statement.into(),
        }
    }

    pub fn undeclared_theory_atom(
        name: impl Into<String>,
        arity: usize,
        statement: impl Into<String>,
    ) -> Self {
        Self::UndeclaredTheoryAtom {
            name: name.into(),
            arity,
            statement: statement.into(),
        }
    }

    pub fn undeclared_theory_operator(
        operator: impl Into<String>,
        arity: &'static str,
        term: impl Into<String>,
        statement: impl Into<String>,
    ) -> Self {
        Self::UndeclaredTheoryOperator {
            operator: operator.into(),
            arity,
            term: term.into(),
            statement: statement.into(),
        }
    }

    pub fn invalid_constant(definition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConstant {
            definition: definition.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }
}

/// Result type for grounding operations.
pub type GroundResult<T> = Result<T, GroundError>;
