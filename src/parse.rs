//! Query text parsing.
//!
//! This module provides:
//! - Tokenizing query text (bare words, quoted strings, backtick identifiers)
//! - Recursive descent parsing into a `QueryTree`
//!
//! Precedence from lowest to highest: `OR`, `XOR`, `AND`, `SUB`, `NOT`,
//! comparisons. `AND` and `OR` chains become single n-ary nodes.

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;

use crate::query::QueryTree;
use anyhow::Result;

/// Parse query text into a tree
pub fn parse_query(query: &str) -> Result<QueryTree> {
    Parser::new(query)?.parse()
}
