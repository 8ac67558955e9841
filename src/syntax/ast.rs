//! This AST is an owned, typed view over the statements of a parsed
//! Peppermint file. It carries no spans and leaves error nodes out;
//! reach for the [`Tree`] itself when positions matter.
//!
//! Statements follow one another freely, several to a line if wanted.
//! Comments start with `;` or `#` and run to the end of the line.
//!
//! ```nasm
//! start:            ; a label definition
//! LOAD [0x10]       ; opcode with an address operand
//! ADD  [[ptr]]      ; addresses nest
//! JUMP start        ; a bare name refers to a label
//! 10: 0b101         ; numbers may name labels; bare numbers are data
//! ```

use std::fmt;

use super::lexer::{NumberForm, TokenKind};
use super::tree::{NodeId, NodeKind, Tree};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Statement {
    Instruction(Instruction),
    Literal(Literal),
    /// A label definition, without its `:`.
    Label(String),
    Comment { marker: char, text: String },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub opcode: String,
    pub operand: Operand,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Address(Box<Operand>),
    LabelJump(String),
    Literal(Literal),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Literal {
    pub text: String,
}

/// Lowers every well-formed statement of `tree`, in program order.
pub fn lower(tree: &Tree) -> Vec<Statement> {
    tree.statements()
        .filter_map(|id| Statement::from_node(tree, id))
        .collect()
}

impl Statement {
    /// Builds the typed form of a `Statement` node.
    pub fn from_node(tree: &Tree, id: NodeId) -> Option<Self> {
        if tree.node(id).kind() != NodeKind::Statement {
            return None;
        }
        let inner = tree.child_nodes(id).next()?;

        match tree.node(inner).kind() {
            NodeKind::Instruction => {
                let opcode = tree.child_tokens(inner).find(|t| t.kind == TokenKind::Opcode)?;
                let operand = tree.child_nodes(inner).next()?;
                Some(Statement::Instruction(Instruction {
                    opcode: tree.text(opcode.span).to_owned(),
                    operand: Operand::from_node(tree, operand)?,
                }))
            }
            NodeKind::Literal => Some(Statement::Literal(Literal::from_node(tree, inner))),
            NodeKind::Label => {
                let name = tree.child_tokens(inner).find(|t| t.kind == TokenKind::LabelDef)?;
                Some(Statement::Label(tree.text(name.span).to_owned()))
            }
            NodeKind::Comment => {
                let mut tokens = tree.child_tokens(inner);
                let marker = tree.text(tokens.next()?.span).chars().next()?;
                let text = tree.text(tokens.next()?.span).to_owned();
                Some(Statement::Comment { marker, text })
            }
            _ => None,
        }
    }
}

impl Operand {
    /// Builds the typed form of an `Operand` node.
    pub fn from_node(tree: &Tree, id: NodeId) -> Option<Self> {
        let inner = tree.child_nodes(id).next()?;
        match tree.node(inner).kind() {
            NodeKind::Address => {
                let nested = tree.child_nodes(inner).next()?;
                Some(Operand::Address(Box::new(Operand::from_node(tree, nested)?)))
            }
            NodeKind::LabelJump => Some(Operand::LabelJump(tree.node_text(inner).to_owned())),
            NodeKind::Literal => Some(Operand::Literal(Literal::from_node(tree, inner))),
            _ => None,
        }
    }
}

impl Literal {
    fn from_node(tree: &Tree, id: NodeId) -> Self {
        Literal { text: tree.node_text(id).to_owned() }
    }

    pub fn form(&self) -> NumberForm {
        NumberForm::of(&self.text)
    }

    /// Decodes the literal's integer value.
    ///
    /// Returns `None` when the digits do not fit the literal's form: a
    /// binary literal with digits other than `0`/`1` (the lexer lets `0bFF`
    /// through), a plain literal containing hex letters, or an overflow.
    pub fn value(&self) -> Option<u64> {
        match self.form() {
            NumberForm::Hexadecimal => u64::from_str_radix(&self.text[2..], 16).ok(),
            NumberForm::Binary => u64::from_str_radix(&self.text[2..], 2).ok(),
            NumberForm::Plain => self.text.parse().ok(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Instruction(ins) => write!(f, "{}", ins),
            Statement::Literal(lit) => write!(f, "{}", lit),
            Statement::Label(name) => write!(f, "{}:", name),
            Statement::Comment { marker, text } => write!(f, "{}{}", marker, text),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.opcode, self.operand)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Address(inner) => write!(f, "[{}]", inner),
            Operand::LabelJump(name) => f.write_str(name),
            Operand::Literal(lit) => write!(f, "{}", lit),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}
