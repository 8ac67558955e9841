//! Recognition of Peppermint assembly source.
//!
//! The [`syntax`] module turns source text into a concrete syntax tree with
//! exact byte spans for every token and node. Parsing never fails outright:
//! malformed input is reported through [`syntax::ParseError`] values returned
//! alongside a best-effort tree.

#[macro_use]
extern crate log;

pub mod syntax;

pub use syntax::parse;
