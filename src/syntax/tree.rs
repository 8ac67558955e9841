//! This tree describes a parsed Peppermint file, concretely.
//!
//! Nodes and tokens live in flat arenas owned by the [`Tree`] and refer to
//! each other by index, so arbitrarily nested addresses never need nested
//! boxes. Whitespace tokens are kept in the token arena but never appear as
//! children; the gaps between sibling spans are always whitespace.
//!
//! ```text
//! loop: ADD [loop]   ; comment
//!
//! (source_file
//!   (statement (label "loop" ":"))
//!   (statement (instruction "ADD" (operand (address "[" (operand (label_jump "loop")) "]"))))
//!   (statement (comment ";" " comment")))
//! ```

use std::fmt;
use std::ops::Range;

use super::lexer::{Token, TokenKind};

/// Half-open byte range into the source text.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub const fn len(self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub const fn as_range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

pub type NodeId = usize;
pub type TokenId = usize;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum NodeKind {
    SourceFile,
    Statement,
    Instruction,
    Operand,
    Literal,
    Address,
    Label,
    LabelJump,
    Comment,
    /// Tokens discarded while recovering from a parse error.
    Error,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        use NodeKind::*;
        match self {
            SourceFile => "source_file",
            Statement => "statement",
            Instruction => "instruction",
            Operand => "operand",
            Literal => "literal",
            Address => "address",
            Label => "label",
            LabelJump => "label_jump",
            Comment => "comment",
            Error => "ERROR",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Child {
    Node(NodeId),
    Token(TokenId),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Node {
    kind: NodeKind,
    span: Span,
    children: Vec<Child>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }
}

/// An immutable concrete syntax tree together with the text it was parsed from.
#[derive(Clone, Debug)]
pub struct Tree {
    source: String,
    tokens: Vec<Token>,
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id]
    }

    /// Every token the parser consumed, whitespace and `EndOfFile` included,
    /// in source order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn text(&self, span: Span) -> &str {
        &self.source[span.as_range()]
    }

    pub fn node_text(&self, id: NodeId) -> &str {
        self.text(self.nodes[id].span)
    }

    pub fn span_of(&self, child: Child) -> Span {
        match child {
            Child::Node(id) => self.nodes[id].span,
            Child::Token(id) => self.tokens[id].span,
        }
    }

    /// The statements and error nodes under the root, in program order.
    pub fn top_level(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.child_nodes(self.root)
    }

    /// The `Statement` nodes under the root, skipping error nodes.
    pub fn statements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.top_level()
            .filter(move |&id| self.nodes[id].kind == NodeKind::Statement)
    }

    pub fn child_nodes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id].children.iter().filter_map(|child| match child {
            Child::Node(id) => Some(*id),
            Child::Token(_) => None,
        })
    }

    pub fn child_tokens(&self, id: NodeId) -> impl Iterator<Item = &Token> + '_ {
        self.nodes[id].children.iter().filter_map(move |child| match child {
            Child::Token(id) => Some(&self.tokens[*id]),
            Child::Node(_) => None,
        })
    }

    /// Node kinds in pre-order, root first.
    pub fn kinds(&self) -> Vec<NodeKind> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(self.nodes[id].kind);
            let children: Vec<NodeId> = self.child_nodes(id).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|n| n.kind == NodeKind::Error)
    }

    /// Renders the tree as an s-expression with every token quoted.
    ///
    /// Nothing is dropped except whitespace, so the rendering is lossless
    /// against the tree's spans.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(self.root, &mut out);
        out
    }

    fn write_sexp(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        out.push('(');
        out.push_str(node.kind.name());
        for child in &node.children {
            out.push(' ');
            match *child {
                Child::Node(inner) => self.write_sexp(inner, out),
                Child::Token(tok) => out.push_str(&format!("{:?}", self.text(self.tokens[tok].span))),
            }
        }
        out.push(')');
    }
}

/// 1-based line and column of a byte offset.
pub(crate) fn position(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}

/// Collects tokens and nodes bottom-up while the parser runs.
#[derive(Default)]
pub(crate) struct TreeBuilder {
    tokens: Vec<Token>,
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn push_token(&mut self, token: Token) -> TokenId {
        self.tokens.push(token);
        self.tokens.len() - 1
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }

    /// Builds a node whose span runs from its first child to its last.
    pub fn reduce(&mut self, kind: NodeKind, children: Vec<Child>) -> NodeId {
        let span = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => Span::new(self.child_span(first).start, self.child_span(last).end),
            _ => Span::default(),
        };
        self.nodes.push(Node { kind, span, children });
        self.nodes.len() - 1
    }

    /// Wraps the top-level children in the root, which spans the whole input.
    pub fn finish(mut self, source: &str, children: Vec<Child>) -> Tree {
        debug_assert!(self.tokens.last().map_or(false, |t| t.kind == TokenKind::EndOfFile));
        self.nodes.push(Node {
            kind: NodeKind::SourceFile,
            span: Span::new(0, source.len()),
            children,
        });
        Tree {
            source: source.to_owned(),
            tokens: self.tokens,
            root: self.nodes.len() - 1,
            nodes: self.nodes,
        }
    }

    fn child_span(&self, child: Child) -> Span {
        match child {
            Child::Node(id) => self.nodes[id].span,
            Child::Token(id) => self.tokens[id].span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, start: usize, end: usize) -> Token {
        Token { kind, span: Span::new(start, end), line: 1, col: start + 1 }
    }

    #[test]
    fn test_span() {
        let a = Span::new(2, 5);
        let b = Span::new(4, 9);
        assert_eq!(a.merge(b), Span::new(2, 9));
        assert_eq!(b.merge(a), Span::new(2, 9));
        assert_eq!(a.len(), 3);
        assert!(!a.is_empty());
        assert!(Span::new(4, 4).is_empty());
        assert_eq!(a.to_string(), "2..5");
        assert_eq!(&"hello world"[a.as_range()], "llo");
    }

    #[test]
    fn test_position() {
        let src = "ADD 1\n  SUB 2\n";
        assert_eq!(position(src, 0), (1, 1));
        assert_eq!(position(src, 4), (1, 5));
        assert_eq!(position(src, 8), (2, 3));
        assert_eq!(position(src, src.len()), (3, 1));
    }

    #[test]
    fn test_builder_spans_and_sexp() {
        let source = "ADD  7";
        let mut builder = TreeBuilder::default();
        let add = builder.push_token(token(TokenKind::Opcode, 0, 3));
        builder.push_token(token(TokenKind::Whitespace, 3, 5));
        let seven = builder.push_token(token(TokenKind::Number, 5, 6));
        builder.push_token(token(TokenKind::EndOfFile, 6, 6));

        let literal = builder.reduce(NodeKind::Literal, vec![Child::Token(seven)]);
        let operand = builder.reduce(NodeKind::Operand, vec![Child::Node(literal)]);
        let instruction = builder.reduce(NodeKind::Instruction, vec![Child::Token(add), Child::Node(operand)]);
        assert_eq!(builder.span(instruction), Span::new(0, 6));
        let statement = builder.reduce(NodeKind::Statement, vec![Child::Node(instruction)]);

        let tree = builder.finish(source, vec![Child::Node(statement)]);
        assert_eq!(tree.node(tree.root()).span(), Span::new(0, 6));
        assert_eq!(tree.node_text(operand), "7");
        assert_eq!(tree.child_tokens(instruction).count(), 1);
        assert_eq!(
            tree.to_sexp(),
            r#"(source_file (statement (instruction "ADD" (operand (literal "7")))))"#
        );
        assert_eq!(
            tree.kinds(),
            vec![
                NodeKind::SourceFile,
                NodeKind::Statement,
                NodeKind::Instruction,
                NodeKind::Operand,
                NodeKind::Literal,
            ]
        );
        assert!(!tree.has_errors());
    }

    #[test]
    fn test_sexp_escapes_token_text() {
        let source = "#\"q\"";
        let mut builder = TreeBuilder::default();
        let marker = builder.push_token(token(TokenKind::CommentMarker, 0, 1));
        let text = builder.push_token(token(TokenKind::CommentText, 1, 4));
        builder.push_token(token(TokenKind::EndOfFile, 4, 4));
        let comment = builder.reduce(NodeKind::Comment, vec![Child::Token(marker), Child::Token(text)]);
        let statement = builder.reduce(NodeKind::Statement, vec![Child::Node(comment)]);
        let tree = builder.finish(source, vec![Child::Node(statement)]);
        assert_eq!(tree.to_sexp(), r##"(source_file (statement (comment "#" "\"q\"")))"##);
    }
}
