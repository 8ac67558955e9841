//! This lexer tokenizes Peppermint.
//!
//! Tokens are handed out one at a time, on request from the parser. The same
//! identifier text can be an opcode, a label reference or a label definition
//! depending on where the parser is, so every request carries a [`Mode`].
//! Every byte of input ends up in exactly one token, whitespace included.
use std::fmt;

use super::tree::Span;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum TokenKind {
    /// Instruction mnemonic at the head of a statement.
    Opcode,
    /// Bare identifier in operand position.
    LabelName,
    /// Identifier (or number) immediately followed by `:`.
    LabelDef,
    Number,
    LBracket,
    RBracket,
    Colon,
    /// `;` or `#`.
    CommentMarker,
    /// Everything after a comment marker up to the end of the line.
    CommentText,
    Whitespace,
    /// A run of characters that cannot begin any token.
    Error,
    EndOfFile,
}

impl TokenKind {
    /// Whether the parser may resynchronise on this token after an error.
    pub fn is_boundary(self) -> bool {
        use TokenKind::*;
        matches!(self, Opcode | LabelDef | Number | CommentMarker | EndOfFile)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind::*;
        let name = match self {
            Opcode => "opcode",
            LabelName => "label reference",
            LabelDef => "label definition",
            Number => "number",
            LBracket => "`[`",
            RBracket => "`]`",
            Colon => "`:`",
            CommentMarker => "comment marker",
            CommentText => "comment text",
            Whitespace => "whitespace",
            Error => "unrecognised input",
            EndOfFile => "end of input",
        };
        f.write_str(name)
    }
}

/// What the parser currently permits, used to classify identifier-shaped text.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mode {
    /// Statement start: identifiers are opcodes unless they define a label.
    Default,
    /// Operand position after an opcode: identifiers are label references
    /// unless they define a label, which ends the enclosing instruction.
    AfterOpcode,
    /// Inside an address, where a bare identifier can only be a label
    /// reference. No `:` lookahead is done here.
    LabelLookahead,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character, counted in characters.
    pub col: usize,
}

/// The three lexical shapes a number literal can take.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NumberForm {
    /// `0x` followed by hex digits.
    Hexadecimal,
    /// `0b` followed by digits. The lexer accepts any hex digit here, not
    /// only `0` and `1`, so `0bFF` is a well-formed token.
    Binary,
    /// Any other digit-led run of hex digits.
    Plain,
}

impl NumberForm {
    pub fn of(text: &str) -> Self {
        if text.starts_with("0x") {
            NumberForm::Hexadecimal
        } else if text.starts_with("0b") {
            NumberForm::Binary
        } else {
            NumberForm::Plain
        }
    }
}

/// A cursor over the source text. Cloning it checkpoints the position.
#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    in_comment: bool,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { source, pos: 0, line: 1, col: 1, in_comment: false, done: false }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Byte offset of the next token.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Produces the next token, classifying identifiers according to `mode`.
    ///
    /// Once the input is exhausted this keeps returning an empty
    /// `EndOfFile` token at the end of the source.
    pub fn next_token(&mut self, mode: Mode) -> Token {
        let (start, line, col) = (self.pos, self.line, self.col);

        let kind = if self.in_comment {
            // The text after a marker is its own token, even when empty.
            self.in_comment = false;
            self.bump_while(|c| c != '\n' && c != '\r');
            TokenKind::CommentText
        } else {
            match self.peek() {
                None => TokenKind::EndOfFile,
                Some(c) if is_whitespace(c) => {
                    self.bump_while(is_whitespace);
                    TokenKind::Whitespace
                }
                Some(';') | Some('#') => {
                    self.bump();
                    self.in_comment = true;
                    TokenKind::CommentMarker
                }
                Some('[') => {
                    self.bump();
                    TokenKind::LBracket
                }
                Some(']') => {
                    self.bump();
                    TokenKind::RBracket
                }
                Some(':') => {
                    self.bump();
                    TokenKind::Colon
                }
                Some(c) if c.is_ascii_digit() => self.number(mode),
                Some(c) if c.is_ascii_alphabetic() => self.identifier(mode),
                Some(_) => {
                    self.bump();
                    self.bump_while(|c| !starts_token(c));
                    TokenKind::Error
                }
            }
        };

        if kind == TokenKind::EndOfFile {
            self.done = true;
        }

        Token { kind, span: Span::new(start, self.pos), line, col }
    }

    fn number(&mut self, mode: Mode) -> TokenKind {
        let source = self.source;
        let bytes = source.as_bytes();
        let start = self.pos;

        // `0x` only counts as a prefix when a hex digit follows it.
        let digits = if bytes[start] == b'0'
            && bytes.get(start + 1) == Some(&b'x')
            && bytes.get(start + 2).map_or(false, u8::is_ascii_hexdigit)
        {
            start + 2
        } else {
            start + 1
        };
        let end = self.scan_bytes(digits, |b| b.is_ascii_hexdigit());

        // Numbers are legal label names, e.g. `10:` or `1st-loop:`.
        if mode != Mode::LabelLookahead {
            let word_end = self.scan_bytes(end, is_word_byte);
            if bytes.get(word_end) == Some(&b':') {
                self.advance_to(word_end);
                return TokenKind::LabelDef;
            }
        }

        self.advance_to(end);
        TokenKind::Number
    }

    fn identifier(&mut self, mode: Mode) -> TokenKind {
        let end = self.scan_bytes(self.pos, is_word_byte);
        self.advance_to(end);

        match mode {
            Mode::LabelLookahead => TokenKind::LabelName,
            _ if self.peek() == Some(':') => TokenKind::LabelDef,
            Mode::Default => TokenKind::Opcode,
            Mode::AfterOpcode => TokenKind::LabelName,
        }
    }

    /// Offset of the first byte at or after `from` that fails `pred`.
    fn scan_bytes(&self, from: usize, pred: impl Fn(u8) -> bool) -> usize {
        let bytes = self.source.as_bytes();
        bytes[from..]
            .iter()
            .position(|&b| !pred(b))
            .map_or(bytes.len(), |n| from + n)
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn advance_to(&mut self, offset: usize) {
        while self.pos < offset {
            self.bump();
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    /// Yields tokens in `Mode::Default`, ending after the single `EndOfFile`.
    fn next(&mut self) -> Option<Token> {
        if self.done {
            None
        } else {
            Some(self.next_token(Mode::Default))
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn starts_token(c: char) -> bool {
    is_whitespace(c) || c.is_ascii_alphanumeric() || matches!(c, ';' | '#' | '[' | ']' | ':')
}
