//! Syntax layer for schema definition documents.
//!
//! This crate provides:
//! - `token`: Token kinds and token structures
//! - `lexer`: Tokenization and string literal decoding
//! - `ast`: Abstract syntax tree types
//! - `parser`: Recursive descent parser with error recovery

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use lexer::Lexer;
pub use parser::{parse, ParseResult};
pub use token::{DirectiveLocation, Token, TokenKind};
