//! Parse error reporting.
//!
//! Errors are collected rather than raised: the parser records one
//! [`ParseError`] per region it had to skip and carries on.

use thiserror::Error;

use super::lexer::TokenKind;
use super::parser::{State, MAX_ADDRESS_DEPTH};
use super::tree::{position, Span};

/// Nature of the problem in malformed input.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
pub enum ErrorKind {
    /// Input that matches no token rule.
    #[error("unrecognised input")]
    UnexpectedInput,
    /// A token the grammar does not allow at this point.
    #[error("unexpected {0}")]
    UnexpectedToken(TokenKind),
    /// An opcode with nothing after it on the same line.
    #[error("instruction is missing its operand")]
    MissingOperand,
    /// A `[` with no matching `]` before the next statement.
    #[error("unclosed `[`")]
    UnclosedBracket,
    #[error("addresses nested deeper than {} levels", MAX_ADDRESS_DEPTH)]
    NestingTooDeep,
}

/// Error originating from malformed input.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("{line}:{col}: {kind} ({state})")]
pub struct ParseError {
    pub kind: ErrorKind,
    /// Everything the parser skipped over for this error.
    pub span: Span,
    /// Where the automaton was when the error was found.
    pub state: State,
    pub line: usize,
    pub col: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, span: Span, state: State, source: &str) -> Self {
        let (line, col) = position(source, span.start);
        ParseError { kind, span, state, line, col }
    }

    /// Lexical errors come from input no token rule accepts; everything else
    /// is a syntax error.
    pub fn is_lexical(&self) -> bool {
        self.kind == ErrorKind::UnexpectedInput
    }

    /// Formats the error with the offending line and a caret under the span.
    pub fn render(&self, source: &str) -> String {
        let line_start = source[..self.span.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[self.span.start..]
            .find('\n')
            .map_or(source.len(), |i| self.span.start + i);
        let text = source[line_start..line_end].trim_end_matches('\r');

        let underline = source[self.span.start..self.span.end.min(line_end)]
            .chars()
            .count()
            .max(1);
        let gutter = self.line.to_string().len();
        // Keep tabs so the caret lines up.
        let indent: String = source[line_start..self.span.start]
            .chars()
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();

        format!(
            "error: {}\n{:>w$}--> {}:{}\n{:>w$} |\n{} | {}\n{:>w$} | {}{}",
            self.kind,
            "",
            self.line,
            self.col,
            "",
            self.line,
            text,
            "",
            indent,
            "^".repeat(underline),
            w = gutter,
        )
    }
}
