//! The Parser module pulls tokens from the lexer on demand and
//! converts them into a concrete syntax tree.
//!
//! It is a shift/reduce automaton: each open non-terminal sits on an
//! explicit frame stack together with the state it is in, and that state
//! decides which lexer [`Mode`] the next token is requested in. Nothing
//! recurses on input depth, so bracket nesting is limited only by
//! [`MAX_ADDRESS_DEPTH`].
//!
//! On an unexpected token the open frames are abandoned into an `Error`
//! node and tokens are skipped until one that can start a statement.
use std::fmt;

use super::error::{ErrorKind, ParseError};
use super::lexer::{Lexer, Mode, TokenKind};
use super::tree::{Child, NodeId, NodeKind, TokenId, Tree, TreeBuilder};

/// Deepest `[` nesting accepted inside a single operand.
pub const MAX_ADDRESS_DEPTH: usize = 256;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    /// Top level, between statements.
    StatementStart,
    /// An opcode has been shifted and exactly one operand must follow.
    /// The operand has to start on the opcode's line; the tree-sitter
    /// grammar Peppermint came from lets it follow a line break instead.
    AfterOpcode,
    /// A label name has been shifted; its `:` comes next.
    AfterLabel,
    /// A comment marker has been shifted; its text comes next.
    InComment,
    /// Just after a `[`, waiting for the inner operand.
    InAddress,
    /// The inner operand of an address is done, waiting for `]`.
    AwaitingClose,
    /// Skipping tokens until the next statement boundary.
    Recovering,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use State::*;
        let text = match self {
            StatementStart => "at statement start",
            AfterOpcode => "after an opcode",
            AfterLabel => "after a label name",
            InComment => "inside a comment",
            InAddress => "inside an address",
            AwaitingClose => "before `]`",
            Recovering => "while recovering",
        };
        f.write_str(text)
    }
}

/// A partially built non-terminal.
struct Frame {
    kind: NodeKind,
    state: State,
    children: Vec<Child>,
}

/// Tokens being skipped after an error, reported once a boundary shows up.
struct Recovery {
    kind: ErrorKind,
    state: State,
    children: Vec<Child>,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    tree: TreeBuilder,
    frames: Vec<Frame>,
    statements: Vec<Child>,
    recovery: Option<Recovery>,
    /// Whether a line break was skipped since the last significant token.
    line_break: bool,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            tree: TreeBuilder::default(),
            frames: Vec::new(),
            statements: Vec::new(),
            recovery: None,
            line_break: false,
            errors: Vec::new(),
        }
    }

    /// Run the parser over the whole input, consuming itself and returning
    /// the tree along with every error found, in source order.
    pub fn run(mut self) -> (Tree, Vec<ParseError>) {
        'mainloop: loop {
            let mode = self.mode();
            let token = self.lexer.next_token(mode);
            trace!("{:?} `{}` at {} ({:?})", token.kind, &self.lexer.source()[token.span.as_range()], token.span, mode);

            let id = self.tree.push_token(token);
            if token.kind == TokenKind::Whitespace {
                let text = &self.lexer.source()[token.span.as_range()];
                self.line_break |= text.contains(|c: char| c == '\n' || c == '\r');
                continue;
            }

            self.step(id, token.kind);
            self.line_break = false;

            if token.kind == TokenKind::EndOfFile {
                break 'mainloop;
            }
        }

        if !self.errors.is_empty() {
            debug!("parse finished with {} error(s)", self.errors.len());
        }

        let tree = self.tree.finish(self.lexer.source(), self.statements);
        (tree, self.errors)
    }

    fn state(&self) -> State {
        if self.recovery.is_some() {
            return State::Recovering;
        }
        self.frames.last().map_or(State::StatementStart, |f| f.state)
    }

    /// The lexer mode the current state asks for.
    fn mode(&self) -> Mode {
        match self.state() {
            State::AfterOpcode if !self.line_break => Mode::AfterOpcode,
            State::InAddress => Mode::LabelLookahead,
            _ => Mode::Default,
        }
    }

    /// Feeds one significant token to the automaton.
    fn step(&mut self, token: TokenId, kind: TokenKind) {
        if let Some(recovery) = self.recovery.as_mut() {
            if !kind.is_boundary() {
                recovery.children.push(Child::Token(token));
                return;
            }
            self.finish_recovery();
        }

        match (self.state(), kind) {
            (State::StatementStart, TokenKind::Opcode) => self.open(NodeKind::Instruction, State::AfterOpcode, token),
            (State::StatementStart, TokenKind::LabelDef) => self.open(NodeKind::Label, State::AfterLabel, token),
            (State::StatementStart, TokenKind::CommentMarker) => self.open(NodeKind::Comment, State::InComment, token),
            (State::StatementStart, TokenKind::Number) => {
                let literal = self.tree.reduce(NodeKind::Literal, vec![Child::Token(token)]);
                self.statement(literal);
            }
            // Accept.
            (State::StatementStart, TokenKind::EndOfFile) => {}

            (State::AfterLabel, TokenKind::Colon) | (State::InComment, TokenKind::CommentText) => {
                if let Some(node) = self.close(token, kind) {
                    self.statement(node);
                }
            }

            // The operand has to start on the opcode's line.
            (State::AfterOpcode, _) if self.line_break => {
                self.abandon(ErrorKind::MissingOperand);
                self.step(token, kind);
            }
            (State::AfterOpcode, TokenKind::Number) | (State::InAddress, TokenKind::Number) => {
                let literal = self.tree.reduce(NodeKind::Literal, vec![Child::Token(token)]);
                self.operand(literal, kind);
            }
            (State::AfterOpcode, TokenKind::LabelName) | (State::InAddress, TokenKind::LabelName) => {
                let jump = self.tree.reduce(NodeKind::LabelJump, vec![Child::Token(token)]);
                self.operand(jump, kind);
            }
            (State::AfterOpcode, TokenKind::LBracket) | (State::InAddress, TokenKind::LBracket) => {
                if self.depth() >= MAX_ADDRESS_DEPTH {
                    self.discard(ErrorKind::NestingTooDeep, token);
                } else {
                    self.open(NodeKind::Address, State::InAddress, token);
                }
            }
            (State::AwaitingClose, TokenKind::RBracket) => {
                if let Some(address) = self.close(token, kind) {
                    self.operand(address, kind);
                }
            }

            // A token that starts the next statement ends this one early. It
            // is not consumed by the error; the statement it starts is parsed.
            (State::AfterOpcode, k) if k.is_boundary() => {
                self.abandon(ErrorKind::MissingOperand);
                self.step(token, kind);
            }
            (State::InAddress, k) | (State::AwaitingClose, k) if k.is_boundary() => {
                self.abandon(ErrorKind::UnclosedBracket);
                self.step(token, kind);
            }

            (_, TokenKind::Error) => self.discard(ErrorKind::UnexpectedInput, token),
            (_, k) => self.discard(ErrorKind::UnexpectedToken(k), token),
        }
    }

    /// Shift the first token of a new non-terminal.
    fn open(&mut self, kind: NodeKind, state: State, token: TokenId) {
        self.frames.push(Frame { kind, state, children: vec![Child::Token(token)] });
    }

    /// Shift the last token of the innermost frame and reduce it.
    ///
    /// With no frame open the token is reported as an error on its own.
    fn close(&mut self, token: TokenId, kind: TokenKind) -> Option<NodeId> {
        match self.frames.pop() {
            Some(mut frame) => {
                frame.children.push(Child::Token(token));
                Some(self.tree.reduce(frame.kind, frame.children))
            }
            None => {
                self.report(ErrorKind::UnexpectedToken(kind), State::StatementStart, vec![Child::Token(token)]);
                None
            }
        }
    }

    /// Wrap a finished operand and hand it to the frame waiting for it.
    /// `kind` is the operand's last token, used if nothing is waiting.
    fn operand(&mut self, inner: NodeId, kind: TokenKind) {
        let operand = self.tree.reduce(NodeKind::Operand, vec![Child::Node(inner)]);

        let in_address = self.frames.last().map_or(false, |f| f.kind == NodeKind::Address);
        if in_address {
            if let Some(frame) = self.frames.last_mut() {
                frame.children.push(Child::Node(operand));
                frame.state = State::AwaitingClose;
            }
        } else if let Some(mut frame) = self.frames.pop() {
            frame.children.push(Child::Node(operand));
            let instruction = self.tree.reduce(frame.kind, frame.children);
            self.statement(instruction);
        } else {
            self.report(ErrorKind::UnexpectedToken(kind), State::StatementStart, vec![Child::Node(operand)]);
        }
    }

    fn statement(&mut self, inner: NodeId) {
        let statement = self.tree.reduce(NodeKind::Statement, vec![Child::Node(inner)]);
        self.statements.push(Child::Node(statement));
    }

    fn depth(&self) -> usize {
        self.frames.iter().filter(|f| f.kind == NodeKind::Address).count()
    }

    fn drain_frames(&mut self) -> Vec<Child> {
        self.frames.drain(..).flat_map(|f| f.children).collect()
    }

    /// Give up on the open statement without consuming the current token.
    fn abandon(&mut self, kind: ErrorKind) {
        let state = self.state();
        let children = self.drain_frames();
        self.report(kind, state, children);
    }

    /// Give up on the open statement, starting with the current token, and
    /// skip until the next statement boundary.
    fn discard(&mut self, kind: ErrorKind, token: TokenId) {
        let state = self.state();
        let mut children = self.drain_frames();
        children.push(Child::Token(token));
        self.recovery = Some(Recovery { kind, state, children });
    }

    fn finish_recovery(&mut self) {
        if let Some(recovery) = self.recovery.take() {
            self.report(recovery.kind, recovery.state, recovery.children);
        }
    }

    fn report(&mut self, kind: ErrorKind, state: State, children: Vec<Child>) {
        let node = self.tree.reduce(NodeKind::Error, children);
        let span = self.tree.span(node);
        self.statements.push(Child::Node(node));

        let error = ParseError::new(kind, span, state, self.lexer.source());
        debug!("{}; skipped {}", error, span);
        self.errors.push(error);
    }
}
