//! # texlint syntax
//!
//! Tokenizer and argument scanners for TeX/LaTeX source.
//!
//! The [`lexer`] turns raw text into a flat stream of positioned [`Token`]s
//! following TeX's category rules closely enough to find structure: control
//! sequences, control symbols, braces, math shifts and the other special
//! characters. Everything between two special characters is a single
//! [`TokenKind::Text`] token.
//!
//! The [`scanners`] are lookahead functions used by the validator to skip
//! over command arguments (definition bodies, `\verb` spans, optional
//! parameters) without misreading them as structural tokens.
//!
//! ```
//! use texlint_syntax::{lexer::tokenize, TokenKind};
//!
//! let source = tokenize(r"\section{Hi} $x^2$").unwrap();
//! assert_eq!(source.tokens[0].control_name(), Some("section"));
//! assert_eq!(source.tokens[1].kind, TokenKind::OpenBrace);
//! ```

pub mod lexer;
pub mod scanners;

pub use lexer::{
    tokenize, tokenize_with_limit, LinePositionTable, TokenizeError, Tokenized, DEFAULT_MAX_TOKENS,
};

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when `offset` lies strictly inside the span, excluding both ends.
    pub fn strictly_contains(&self, offset: usize) -> bool {
        offset > self.start && offset < self.end
    }
}

/// A zero-based row/column pair. Columns are byte offsets within the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// The category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Text,
    /// `\foo` or `\@`; see [`Token::control`].
    Backslash,
    OpenBrace,
    CloseBrace,
    Dollar,
    Ampersand,
    Hash,
    Caret,
    Underscore,
    Tilde,
}

impl TokenKind {
    /// The single character a special token was lexed from.
    pub fn as_char(self) -> Option<char> {
        match self {
            TokenKind::Text => None,
            TokenKind::Backslash => Some('\\'),
            TokenKind::OpenBrace => Some('{'),
            TokenKind::CloseBrace => Some('}'),
            TokenKind::Dollar => Some('$'),
            TokenKind::Ampersand => Some('&'),
            TokenKind::Hash => Some('#'),
            TokenKind::Caret => Some('^'),
            TokenKind::Underscore => Some('_'),
            TokenKind::Tilde => Some('~'),
        }
    }

    pub(crate) fn from_special(c: char) -> Option<Self> {
        match c {
            '{' => Some(TokenKind::OpenBrace),
            '}' => Some(TokenKind::CloseBrace),
            '$' => Some(TokenKind::Dollar),
            '&' => Some(TokenKind::Ampersand),
            '#' => Some(TokenKind::Hash),
            '^' => Some(TokenKind::Caret),
            '_' => Some(TokenKind::Underscore),
            '~' => Some(TokenKind::Tilde),
            _ => None,
        }
    }
}

/// The name carried by a [`TokenKind::Backslash`] token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlWord {
    /// `section` for `\section`, `@` for `\@`. Empty for a backslash at end of input.
    pub name: String,
    /// `true` for a control symbol (backslash plus one non-letter).
    pub symbol: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Zero-based line of the token's first character.
    pub line: usize,
    pub kind: TokenKind,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlWord>,
}

impl Token {
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Name of a control sequence or symbol, without the backslash.
    pub fn control_name(&self) -> Option<&str> {
        self.control.as_ref().map(|c| c.name.as_str())
    }

    pub fn is_control_symbol(&self) -> bool {
        self.control.as_ref().is_some_and(|c| c.symbol)
    }

    pub fn is_control_word(&self) -> bool {
        self.control.as_ref().is_some_and(|c| !c.symbol)
    }
}

/// A `%` comment, spanning from the `%` up to (not including) the newline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub line: usize,
    pub span: Span,
}
