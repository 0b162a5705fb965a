//! Pipeline configuration.

use std::path::PathBuf;

/// Settings of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// `name=value` definitions overriding `#const` defaults.
    pub constants: Vec<String>,
    /// Emit only the symbols shown by the visibility encodings.
    pub clean_output: bool,
    /// Directory receiving `reified_output_full.lp` and `reified_output_clean.lp`.
    pub dump_dir: Option<PathBuf>,
    /// Directory whose `<name>.lp` files replace the builtin encodings.
    pub encodings_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            constants: Vec::new(),
            clean_output: true,
            dump_dir: None,
            encodings_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constant(mut self, definition: impl Into<String>) -> Self {
        self.constants.push(definition.into());
        self
    }

    pub fn with_constants<I, S>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constants.extend(definitions.into_iter().map(Into::into));
        self
    }

    pub fn with_clean_output(mut self, clean: bool) -> Self {
        self.clean_output = clean;
        self
    }

    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    pub fn with_encodings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.encodings_dir = Some(dir.into());
        self
    }
}
