//! metalp pipeline
//!
//! The meta-compiler's stages behind one facade:
//! - Extension chain (text of one extension feeds the next)
//! - Reification of the final text with theory-symbol patching
//! - Output filter solving the meta-facts with the companion encodings
//! - Optional diagnostic dumps
//! - Configuration and the error taxonomy

mod chain;
mod config;
mod dump;
mod error;
mod filter;
mod pipeline;
mod reify;

pub use chain::run_chain;
pub use config::PipelineConfig;
pub use dump::{write_dump, CLEAN_DUMP, FULL_DUMP};
pub use error::{ErrorKind, FilterError, PipelineError, PipelineResult};
pub use filter::{filter_output, render_symbols, BASE_ENCODING};
pub use pipeline::Pipeline;
pub use reify::reify_program;
