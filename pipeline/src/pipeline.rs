//! The end-to-end meta-compilation pipeline.

use std::path::PathBuf;

use metalp_extension::{default_extensions, Encodings, Extension, Identity};
use tracing::{info, info_span};

use crate::chain::run_chain;
use crate::config::PipelineConfig;
use crate::dump::{write_dump, CLEAN_DUMP, FULL_DUMP};
use crate::error::PipelineResult;
use crate::filter::{filter_output, render_symbols};
use crate::reify::reify_program;

/// Runs the extension chain, reification, theory-symbol patching and the
/// output filter in sequence.
pub struct Pipeline {
    config: PipelineConfig,
    extensions: Vec<Box<dyn Extension>>,
    encodings: Encodings,
}

impl Pipeline {
    /// Pipeline with the default extensions: tagging, then visibility.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_extensions(config, default_extensions())
    }

    pub fn with_extensions(config: PipelineConfig, extensions: Vec<Box<dyn Extension>>) -> Self {
        let encodings = match &config.encodings_dir {
            Some(dir) => Encodings::with_dir(dir),
            None => Encodings::builtin(),
        };
        Self {
            config,
            extensions,
            encodings,
        }
    }

    /// Meta-compile `files` followed by `inline` text.
    pub fn run(&self, files: &[PathBuf], inline: Option<&str>) -> PipelineResult<String> {
        let _span = info_span!("pipeline", files = files.len()).entered();

        let program = run_chain(&self.extensions, files, inline)?;
        info!(bytes = program.len(), "extension chain finished");

        let log = reify_program(&program, &self.config.constants)?;
        if let Some(dir) = &self.config.dump_dir {
            write_dump(dir, FULL_DUMP, &log.to_program());
        }

        let symbols = filter_output(
            &log,
            &self.extensions,
            &self.encodings,
            self.config.clean_output,
        )?;
        let output = render_symbols(&symbols);
        if let Some(dir) = &self.config.dump_dir {
            write_dump(dir, CLEAN_DUMP, &output);
        }
        info!(facts = symbols.len(), "output filtered");
        Ok(output)
    }

    /// Plain reification: no extensions and no filter.
    pub fn classic(&self, files: &[PathBuf], inline: Option<&str>) -> PipelineResult<String> {
        let _span = info_span!("classic", files = files.len()).entered();

        let program = metalp_extension::rewrite(&mut Identity, files, inline)?;
        let log = reify_program(&program, &self.config.constants)?;
        Ok(log.to_program())
    }
}
