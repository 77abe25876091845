//! Structural delimiters: environments, groups and math shifts.
//!
//! Every construct that opens or closes a region of the document becomes a
//! [`Delimiter`]. Delimiters live in an arena owned by the
//! [`Environments`] state machine and are referred to by [`DelimiterId`];
//! the [`DocumentTree`] records how they nest.

use crate::math_mode::{GroupHint, MathMode};
use texlint_syntax::Token;

mod machine;
mod tree;

#[cfg(test)]
mod tests;

pub use machine::Environments;
pub use tree::{Context, ContextKind, ContextRange, DocumentTree, NodeId};

/// Index of a delimiter in the [`Environments`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelimiterId(pub usize);

/// The construct a delimiter was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    OpenGroup,    // {
    CloseGroup,   // }
    Begin,        // \begin{name}
    End,          // \end{name}
    Left,         // \left
    Right,        // \right
    OpenParen,    // \(
    CloseParen,   // \)
    OpenBracket,  // \[
    CloseBracket, // \]
    Dollar,       // $
    DoubleDollar, // $$
}

impl Command {
    /// The command that closes this one, for everything except `\begin`.
    pub fn closer(self) -> Option<Command> {
        match self {
            Command::OpenGroup => Some(Command::CloseGroup),
            Command::Left => Some(Command::Right),
            Command::OpenBracket => Some(Command::CloseBracket),
            Command::OpenParen => Some(Command::CloseParen),
            Command::Dollar => Some(Command::Dollar),
            Command::DoubleDollar => Some(Command::DoubleDollar),
            _ => None,
        }
    }

    /// Rank used to decide which side of a mismatch to discard. Display
    /// math brackets are unranked and never compare greater or smaller.
    pub fn precedence(self) -> Option<u8> {
        match self {
            Command::OpenGroup | Command::CloseGroup => Some(1),
            Command::Left | Command::Right => Some(2),
            Command::Dollar => Some(3),
            Command::DoubleDollar | Command::Begin | Command::End => Some(4),
            _ => None,
        }
    }
}

/// An opening or closing construct tracked by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub command: Command,
    /// The token the delimiter starts at (`\begin`, `{`, `$`...).
    pub token: Token,
    /// Environment name for `\begin`/`\end`.
    pub name: Option<String>,
    /// The `}` closing an environment name, when there is one.
    pub close_token: Option<Token>,
    /// Set by the state machine when the delimiter is pushed.
    pub math_mode: MathMode,
    pub verbatim: bool,
    /// Requested math mode for a `{` group.
    pub hint: GroupHint,
}

impl Delimiter {
    pub fn new(command: Command, token: Token) -> Self {
        Self {
            command,
            token,
            name: None,
            close_token: None,
            math_mode: MathMode::Outside,
            verbatim: false,
            hint: GroupHint::Inherit,
        }
    }

    pub fn group(token: Token, hint: GroupHint) -> Self {
        Self { hint, ..Self::new(Command::OpenGroup, token) }
    }

    pub fn environment(command: Command, name: String, token: Token, close_token: Token) -> Self {
        Self {
            name: Some(name),
            close_token: Some(close_token),
            ..Self::new(command, token)
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The token a diagnostic ending at this delimiter should end at.
    pub fn end_token(&self) -> &Token {
        self.close_token.as_ref().unwrap_or(&self.token)
    }

    /// True when `close` closes this delimiter.
    pub fn closed_by(&self, close: &Delimiter) -> bool {
        if close.command == Command::End {
            self.command == Command::Begin && self.name == close.name
        } else {
            self.command.closer() == Some(close.command)
        }
    }

    /// Human readable form used in diagnostics.
    pub fn describe(&self) -> String {
        match self.command {
            Command::Begin => format!("\\begin{{{}}}", self.name().unwrap_or_default()),
            Command::End => format!("\\end{{{}}}", self.name().unwrap_or_default()),
            Command::OpenGroup => "open group {".to_string(),
            Command::CloseGroup => "close group }".to_string(),
            Command::OpenBracket => "open display math \\[".to_string(),
            Command::CloseBracket => "close display math \\]".to_string(),
            Command::OpenParen => "open inline math \\(".to_string(),
            Command::CloseParen => "close inline math \\)".to_string(),
            Command::Dollar => "$".to_string(),
            Command::DoubleDollar => "$$".to_string(),
            Command::Left => "\\left".to_string(),
            Command::Right => "\\right".to_string(),
        }
    }
}
