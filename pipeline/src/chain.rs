//! Sequential application of extensions.

use std::path::PathBuf;

use metalp_extension::Extension;
use tracing::info;

use crate::error::PipelineResult;

/// Run `extensions` in order. The first one reads `files` and `inline`; every
/// later one rewrites the text produced by its predecessor.
pub fn run_chain(
    extensions: &[Box<dyn Extension>],
    files: &[PathBuf],
    inline: Option<&str>,
) -> PipelineResult<String> {
    let mut files = files;
    let mut text: Option<String> = inline.map(str::to_string);
    for extension in extensions {
        info!(extension = extension.name(), "applying extension");
        let out = extension.transform(files, text.as_deref())?;
        files = &[];
        text = Some(out);
    }
    Ok(text.unwrap_or_default())
}
