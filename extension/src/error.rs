//! Extension error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while rewriting a program or loading encodings.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// Source text failed to parse.
    #[error("syntax error in {origin}: {error}")]
    Syntax {
        origin: String,
        error: metalp_parser::ParseError,
    },

    /// A tag comment could not be read.
    #[error("invalid tag comment `{comment}`{}: {message}", in_rule(.rule))]
    TagSyntax {
        comment: String,
        /// Rule text generated from the comment, when one was attempted.
        rule: Option<String>,
        message: String,
    },

    /// An input file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A companion encoding could not be found or read.
    #[error("encoding '{name}': {message}")]
    Resource { name: String, message: String },

    #[error("invalid comment pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}

impl ExtensionError {
    pub fn syntax(origin: impl Into<String>, error: metalp_parser::ParseError) -> Self {
        Self::Syntax {
            origin: origin.into(),
            error,
        }
    }

    pub fn tag_syntax(
        comment: impl Into<String>,
        rule: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TagSyntax {
            comment: comment.into(),
            rule,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn resource(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resource {
            name: name.into(),
            message: message.into(),
        }
    }
}

fn in_rule(rule: &Option<String>) -> String {
    rule.as_ref()
        .map(|rule| format!(" (rule `{}`)", rule.trim()))
        .unwrap_or_default()
}

/// Result type for extension operations.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_syntax_message_names_the_rule() {
        let err = ExtensionError::tag_syntax("% @x :: p(", Some("p(.".to_string()), "bad");
        assert_eq!(err.to_string(), "invalid tag comment `% @x :: p(` (rule `p(.`): bad");

        let err = ExtensionError::tag_syntax("% @x(", None, "bad");
        assert_eq!(err.to_string(), "invalid tag comment `% @x(`: bad");
    }
}
