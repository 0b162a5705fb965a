//! Visibility of native `#show` output.

use crate::extension::Extension;

/// Keeps statements unchanged and contributes the `show` encoding, which lets
/// `output/2` meta-facts survive filtering.
///
/// Rewriting `#show` directives into rules would hook in through
/// [`Extension::visitor`]; no such rewrite exists yet.
#[derive(Debug, Default)]
pub struct ShowExtension;

impl ShowExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Extension for ShowExtension {
    fn name(&self) -> &'static str {
        "show"
    }

    fn encoding(&self) -> Option<&'static str> {
        Some("show")
    }
}
