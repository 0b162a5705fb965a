//! The extension capability interface.

use std::fs;
use std::path::PathBuf;

use metalp_ground::Control;
use metalp_parser::{parse_program, Statement};
use tracing::debug;

use crate::error::{ExtensionError, ExtensionResult};
use crate::resources::Encodings;

/// Rewrites statements one at a time.
///
/// A visitor is created fresh for every run and holds all state of that run.
pub trait Visitor {
    /// Rewrite `statement`; `None` removes it from the output.
    fn visit(&mut self, statement: Statement) -> ExtensionResult<Option<Statement>>;

    /// Called once after the last statement.
    fn finish(&mut self) -> ExtensionResult<()> {
        Ok(())
    }
}

/// Leaves every statement unchanged.
#[derive(Debug, Default)]
pub struct Identity;

impl Visitor for Identity {
    fn visit(&mut self, statement: Statement) -> ExtensionResult<Option<Statement>> {
        Ok(Some(statement))
    }
}

/// A chain-composable program rewriting unit.
///
/// Every hook has a default, so an extension only overrides what it needs.
pub trait Extension {
    fn name(&self) -> &'static str;

    /// Declare command-line options.
    fn register_options(&self, command: clap::Command) -> clap::Command {
        command
    }

    /// Fresh visitor for one run.
    fn visitor(&self) -> ExtensionResult<Box<dyn Visitor>> {
        Ok(Box::new(Identity))
    }

    /// Rewrite `files` followed by `prior` into program text.
    fn transform(&self, files: &[PathBuf], prior: Option<&str>) -> ExtensionResult<String> {
        let mut visitor = self.visitor()?;
        rewrite(visitor.as_mut(), files, prior)
    }

    /// Name of the companion encoding used by the output filter.
    fn encoding(&self) -> Option<&'static str> {
        None
    }

    /// Add declarative rules to the filter's control.
    fn extend_grounding(&self, control: &mut Control, encodings: &Encodings) -> ExtensionResult<()> {
        if let Some(name) = self.encoding() {
            debug!(extension = self.name(), encoding = name, "loading encoding");
            control.add(encodings.load(name)?);
        }
        Ok(())
    }
}

/// Parse `files` in order, then `prior`, and render every visited statement
/// on its own line.
pub fn rewrite(
    visitor: &mut dyn Visitor,
    files: &[PathBuf],
    prior: Option<&str>,
) -> ExtensionResult<String> {
    let mut out = String::new();
    for path in files {
        let text = fs::read_to_string(path).map_err(|e| ExtensionError::io(path, e))?;
        let statements =
            parse_program(&text).map_err(|e| ExtensionError::syntax(path.display().to_string(), e))?;
        visit_all(visitor, statements, &mut out)?;
    }
    if let Some(text) = prior {
        let statements = parse_program(text).map_err(|e| ExtensionError::syntax("<input>", e))?;
        visit_all(visitor, statements, &mut out)?;
    }
    visitor.finish()?;
    Ok(out)
}

fn visit_all(
    visitor: &mut dyn Visitor,
    statements: Vec<Statement>,
    out: &mut String,
) -> ExtensionResult<()> {
    for statement in statements {
        if let Some(statement) = visitor.visit(statement)? {
            out.push_str(&statement.to_string());
            out.push('\n');
        }
    }
    Ok(())
}
