//! metalp parser
//!
//! This crate turns logic program text into statements and back:
//! - Lexing with comments kept as tokens
//! - Statement parsing (rules, facts, constraints, directives, theory definitions)
//! - Term and theory term parsing
//! - Canonical rendering of every node through `Display`
//! - Error handling with location information

mod ast;
mod error;
mod lexer;
mod parser;
mod render;

pub use ast::*;
pub use error::*;
pub use parser::{parse_program, parse_term, Parser};
