//! metalp extension
//!
//! Chain-composable program rewriting:
//! - The `Extension` capability interface with default hooks
//! - Per-run `Visitor` state for statement rewriting
//! - Tag extension (comment-driven provenance tags)
//! - Show extension (native `#show` visibility)
//! - Companion encodings for the output filter

mod error;
mod extension;
mod resources;
mod show;
mod tag;

pub use error::{ExtensionError, ExtensionResult};
pub use extension::{rewrite, Extension, Identity, Visitor};
pub use resources::Encodings;
pub use show::ShowExtension;
pub use tag::{TagExtension, TagVisitor, TAG_THEORY};

/// The default chain: tagging first, then visibility.
pub fn default_extensions() -> Vec<Box<dyn Extension>> {
    vec![Box::new(TagExtension::new()), Box::new(ShowExtension::new())]
}
