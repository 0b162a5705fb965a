//! metalp core types
//!
//! This crate provides the foundational types shared by every stage:
//! - Ground symbols (the values terms evaluate to) and their canonical text
//! - Predicate signatures
//! - Program atom identifiers and literals

mod id;
mod signature;
mod symbol;

pub use id::*;
pub use signature::*;
pub use symbol::*;
