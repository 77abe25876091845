//! Collection and finalization of diagnostics.

use crate::delimiters::Delimiter;
use serde::{Deserialize, Serialize};
use std::fmt;
use texlint_syntax::{LinePositionTable, Position, Span, Token, Tokenized};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// A positioned problem in the document. Rows and columns are zero-based,
/// the end is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
    pub severity: Severity,
    pub message: String,
    /// Editors may hide this while the user is still typing.
    pub suppress_if_editing: bool,
    /// Raised by math-mode tracking; subject to the cap and shortcut filter.
    pub math_mode: bool,
    /// Whether a marker belongs at the start rather than the end.
    pub anchor_at_start: bool,
}

impl Diagnostic {
    pub fn start(&self) -> Position {
        Position::new(self.start_row, self.start_col)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_row, self.end_col)
    }

    /// Where an editor should place the marker.
    pub fn anchor(&self) -> Position {
        if self.anchor_at_start {
            self.start()
        } else {
            self.end()
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.anchor();
        write!(f, "{}:{}: {}: {}", at.row, at.column, self.severity, self.message)
    }
}

/// Options attached to a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub severity: Severity,
    pub suppress_if_editing: bool,
    pub at_start: bool,
    pub math_mode: bool,
}

impl Flags {
    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn info(mut self) -> Self {
        self.severity = Severity::Info;
        self
    }

    pub fn suppress(mut self) -> Self {
        self.suppress_if_editing = true;
        self
    }

    pub fn at_start(mut self) -> Self {
        self.at_start = true;
        self
    }

    pub fn math(mut self) -> Self {
        self.math_mode = true;
        self
    }
}

#[derive(Debug, Clone)]
struct TokenDiagnostic {
    diagnostic: Diagnostic,
    span: Span,
    ignore: bool,
}

/// Accumulates diagnostics during a validation run.
///
/// Token diagnostics and environment diagnostics are kept apart: the former
/// carry absolute offsets so the ones falling inside a verbatim region can
/// be dropped once the region is known.
#[derive(Debug)]
pub struct ErrorReporter<'a> {
    lines: &'a LinePositionTable,
    end: Position,
    token_errors: Vec<TokenDiagnostic>,
    errors: Vec<Diagnostic>,
    /// Drop math diagnostics at the end of the run.
    pub filter_math: bool,
}

impl<'a> ErrorReporter<'a> {
    pub fn new(source: &'a Tokenized<'_>) -> Self {
        Self {
            lines: &source.lines,
            end: source.end_position(),
            token_errors: Vec::new(),
            errors: Vec::new(),
            filter_math: false,
        }
    }

    fn column(&self, token: &Token, offset: usize) -> usize {
        self.lines.column(token.line, offset)
    }

    fn token_end(token: &Token) -> usize {
        token.end().max(token.start() + 1)
    }

    /// Reports a problem with a single token.
    pub fn token_error(&mut self, token: &Token, message: impl Into<String>, flags: Flags) {
        let end = Self::token_end(token);
        let end_position = Position::new(token.line, self.column(token, end));
        self.push_token_error(token, end, end_position, message.into(), flags);
    }

    /// Reports a problem running from `from` to byte offset `end`.
    pub fn token_error_to(
        &mut self,
        from: &Token,
        end: usize,
        message: impl Into<String>,
        flags: Flags,
    ) {
        let end_position = self.lines.position(end);
        self.push_token_error(from, end, end_position, message.into(), flags);
    }

    fn push_token_error(
        &mut self,
        from: &Token,
        end: usize,
        end_position: Position,
        message: String,
        flags: Flags,
    ) {
        let start_col = self.column(from, from.start());
        self.token_errors.push(TokenDiagnostic {
            diagnostic: Diagnostic {
                start_row: from.line,
                start_col,
                end_row: end_position.row,
                end_col: end_position.column,
                severity: flags.severity,
                message,
                suppress_if_editing: flags.suppress_if_editing,
                math_mode: flags.math_mode,
                anchor_at_start: true,
            },
            span: Span::new(from.start(), end),
            ignore: false,
        });
    }

    /// Reports a problem spanning from one delimiter to another.
    pub fn env_error_from_to(
        &mut self,
        from: &Delimiter,
        to: &Delimiter,
        message: impl Into<String>,
        flags: Flags,
    ) {
        let from_token = &from.token;
        let to_token = to.end_token();
        self.errors.push(Diagnostic {
            start_row: from_token.line,
            start_col: self.column(from_token, from_token.start()),
            end_row: to_token.line,
            end_col: self.column(to_token, Self::token_end(to_token)),
            severity: flags.severity,
            message: message.into(),
            suppress_if_editing: flags.suppress_if_editing,
            math_mode: flags.math_mode,
            anchor_at_start: flags.at_start,
        });
    }

    /// Reports a problem running from the start of the document to `to`.
    pub fn env_error_to(&mut self, to: &Delimiter, message: impl Into<String>, flags: Flags) {
        let token = to.end_token();
        self.errors.push(Diagnostic {
            start_row: 0,
            start_col: 0,
            end_row: token.line,
            end_col: self.column(token, Self::token_end(token)),
            severity: flags.severity,
            message: message.into(),
            suppress_if_editing: flags.suppress_if_editing,
            math_mode: flags.math_mode,
            anchor_at_start: false,
        });
    }

    /// Reports a problem running from `from` to the end of the document.
    pub fn env_error_from(&mut self, from: &Delimiter, message: impl Into<String>, flags: Flags) {
        let token = &from.token;
        self.errors.push(Diagnostic {
            start_row: token.line,
            start_col: self.column(token, token.start()),
            end_row: self.end.row,
            end_col: self.end.column,
            severity: flags.severity,
            message: message.into(),
            suppress_if_editing: flags.suppress_if_editing,
            math_mode: flags.math_mode,
            anchor_at_start: true,
        });
    }

    /// Marks token diagnostics starting strictly inside any of `spans`.
    pub fn ignore_within(&mut self, spans: &[Span]) {
        if spans.is_empty() {
            return;
        }
        for error in &mut self.token_errors {
            if spans.iter().any(|s| s.strictly_contains(error.span.start)) {
                error.ignore = true;
            }
        }
    }

    /// Produces the final list of diagnostics.
    ///
    /// Token diagnostics come first. More than `max_math_errors` math
    /// diagnostics means math-mode tracking went astray, so nothing is
    /// returned at all; otherwise math diagnostics are dropped when
    /// [`ErrorReporter::filter_math`] is set.
    pub fn finish(self, max_math_errors: usize) -> Vec<Diagnostic> {
        let all: Vec<Diagnostic> = self
            .token_errors
            .into_iter()
            .filter(|e| !e.ignore)
            .map(|e| e.diagnostic)
            .chain(self.errors)
            .collect();

        let math_errors = all.iter().filter(|d| d.math_mode).count();
        if math_errors > max_math_errors {
            log::debug!(
                "{} math diagnostics exceed the limit of {}, dropping all diagnostics",
                math_errors,
                max_math_errors
            );
            return Vec::new();
        }

        if self.filter_math && math_errors > 0 {
            return all.into_iter().filter(|d| !d.math_mode).collect();
        }
        all
    }
}
