//! Companion encodings used by the output filter.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{ExtensionError, ExtensionResult};

const BUILTIN: &[(&str, &str)] = &[
    ("base", include_str!("../encodings/base.lp")),
    ("tag", include_str!("../encodings/tag.lp")),
    ("show", include_str!("../encodings/show.lp")),
];

/// Resolves encodings by name.
///
/// A `<dir>/<name>.lp` file in the override directory wins over the builtin
/// copy.
#[derive(Debug, Clone, Default)]
pub struct Encodings {
    dir: Option<PathBuf>,
}

impl Encodings {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn load(&self, name: &str) -> ExtensionResult<String> {
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{}.lp", name));
            if path.is_file() {
                debug!(encoding = name, path = %path.display(), "loading encoding from directory");
                return fs::read_to_string(&path)
                    .map_err(|e| ExtensionError::resource(name, format!("{}: {}", path.display(), e)));
            }
        }
        BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, text)| text.to_string())
            .ok_or_else(|| ExtensionError::resource(name, "no such encoding"))
    }
}
