//! The syntax module is in charge of taking Peppermint
//! source text and producing a concrete syntax tree.
//!
//! It does this with a mode-aware lexer that the parser
//! drives one token at a time, and a shift/reduce parser
//! that keeps its open non-terminals on an explicit stack.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod tree;

pub use error::{ErrorKind, ParseError};
pub use lexer::{Lexer, Mode, NumberForm, Token, TokenKind};
pub use parser::{Parser, State, MAX_ADDRESS_DEPTH};
pub use tree::{Child, Node, NodeId, NodeKind, Span, TokenId, Tree};

/// Parses `source` into a tree and the ordered list of errors met on the way.
///
/// The tree always spans the whole input, even when errors are returned.
pub fn parse(source: &str) -> (Tree, Vec<ParseError>) {
    Parser::new(source).run()
}
