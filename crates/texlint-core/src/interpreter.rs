//! The token walk that turns a token stream into delimiter pushes and
//! token-level diagnostics.
//!
//! Most control sequences are irrelevant for structure and are skipped.
//! The interesting ones fall into three groups:
//!
//! - **Structure**: `\begin`, `\end`, `\left`, `\right`, `\(`, `\)`, `\[`,
//!   `\]`, plus `{`, `}` and `$` tokens, which become [`Delimiter`]s.
//! - **Definitions**: `\newcommand`, `\def`, `\newenvironment`... whose
//!   arguments may contain unbalanced structure on purpose. Their arguments
//!   are skipped with the [`scanners`].
//! - **Math hints**: text-box macros force their argument out of math mode,
//!   unknown macros make it [`MathMode::Unknown`], Greek letters and
//!   sectioning commands are checked against the current mode.

use crate::delimiters::{Command, Delimiter, Environments};
use crate::math_mode::{self, GroupHint, MathMode};
use crate::reporter::{ErrorReporter, Flags};
use texlint_syntax::{scanners, Token, TokenKind, Tokenized};

/// Brackets accepted after `\left` and `\right`.
const BRACKETS: &str = "(){}[]<>/|\\.";

struct Interpreter<'s, 'a, 'r> {
    source: &'s Tokenized<'a>,
    reporter: &'r mut ErrorReporter<'s>,
    environments: Environments,
    /// Math mode requested for the next `{` group.
    next_group: GroupHint,
    /// Hints of the enclosing groups, so `\foo{..}{..}` applies the hint of
    /// `\foo` to every argument.
    group_hints: Vec<GroupHint>,
    seen_begin_shortcut: bool,
    seen_end_shortcut: bool,
}

/// Walks the tokens of `source`, feeding delimiters to a fresh state
/// machine and token diagnostics to `reporter`. The returned machine still
/// has to be finished.
pub fn interpret<'s>(source: &'s Tokenized<'_>, reporter: &mut ErrorReporter<'s>) -> Environments {
    let mut interpreter = Interpreter {
        source,
        reporter,
        environments: Environments::new(),
        next_group: GroupHint::Inherit,
        group_hints: Vec::new(),
        seen_begin_shortcut: false,
        seen_end_shortcut: false,
    };
    interpreter.run();

    if interpreter.seen_begin_shortcut && interpreter.seen_end_shortcut {
        log::debug!("equation shortcut macros in use, math diagnostics will be filtered");
        interpreter.reporter.filter_math = true;
    }
    interpreter.environments
}

impl<'s, 'a, 'r> Interpreter<'s, 'a, 'r> {
    fn push(&mut self, delimiter: Delimiter) {
        self.environments.push(delimiter, self.reporter);
    }

    fn run(&mut self) {
        let mut i = 0;
        while i < self.source.tokens.len() {
            i = self.step(i) + 1;
        }
    }

    /// Interprets the token at `i`. Returns the index of the last token
    /// consumed.
    fn step(&mut self, i: usize) -> usize {
        let source = self.source;
        let token = &source.tokens[i];

        match token.kind {
            TokenKind::OpenBrace => {
                self.push(Delimiter::group(token.clone(), self.next_group));
                self.group_hints.push(self.next_group);
                self.next_group = GroupHint::Inherit;
                return i;
            }
            TokenKind::CloseBrace => {
                self.push(Delimiter::new(Command::CloseGroup, token.clone()));
                self.next_group = self.group_hints.pop().unwrap_or(GroupHint::Unknown);
                return i;
            }
            _ => self.next_group = GroupHint::Inherit,
        }

        match token.kind {
            TokenKind::Backslash => self.control(i),
            TokenKind::Dollar => self.dollar(i),
            TokenKind::Caret | TokenKind::Underscore => {
                if self.environments.math_mode() == MathMode::Outside
                    && !self.environments.inside_group()
                {
                    let c = token.kind.as_char().unwrap_or('^');
                    self.reporter.token_error(
                        token,
                        format!("{} must be inside math mode", c),
                        Flags::default().math(),
                    );
                }
                i
            }
            _ => i,
        }
    }

    /// `$$` opens display math outside math and closes it inside `$$`;
    /// anywhere else two dollars are a close and an open.
    fn dollar(&mut self, i: usize) -> usize {
        let tokens = &self.source.tokens;
        let next_is_dollar = tokens.get(i + 1).is_some_and(|t| t.is(TokenKind::Dollar));
        let mode = self.environments.math_mode();
        let in_display = mode
            .opener()
            .is_some_and(|id| self.environments.get(id).command == Command::DoubleDollar);

        if next_is_dollar && (!mode.is_inside() || in_display) {
            // Closing on the second dollar keeps both inside the region.
            let token = if in_display { &tokens[i + 1] } else { &tokens[i] };
            self.push(Delimiter::new(Command::DoubleDollar, token.clone()));
            i + 1
        } else {
            self.push(Delimiter::new(Command::Dollar, tokens[i].clone()));
            i
        }
    }

    fn control(&mut self, i: usize) -> usize {
        let source = self.source;
        let token = &source.tokens[i];
        let Some(control) = &token.control else {
            return i;
        };
        let name = control.name.as_str();

        match name {
            "begin" | "end" => return self.environment(i),
            _ if math_mode::is_begin_shortcut(name) => {
                self.seen_begin_shortcut = true;
                return i;
            }
            _ if math_mode::is_end_shortcut(name) => {
                self.seen_end_shortcut = true;
                return i;
            }
            _ => {}
        }

        match name {
            "newcommand" | "renewcommand" | "DeclareRobustCommand" => {
                let Some(k) = scanners::single_argument(source, i, true) else {
                    return i;
                };
                let k = skip(k, scanners::optional_numeric_params(source, k));
                skip(k, scanners::definition_body(source, k))
            }
            "def" => {
                let Some(k) = scanners::single_argument(source, i, false) else {
                    return i;
                };
                let k = skip(k, scanners::def_optional_params(source, k));
                skip(k, scanners::definition_body(source, k))
            }
            "let" => scanners::let_binding(source, i).unwrap_or(i),
            "newcolumntype" => {
                let Some(k) = scanners::name_argument(source, i) else {
                    return i;
                };
                let k = skip(k, scanners::optional_numeric_params(source, k));
                skip(k, scanners::definition_body(source, k))
            }
            "newenvironment" | "renewenvironment" => {
                let Some(k) = scanners::name_argument(source, i) else {
                    return i;
                };
                let k = skip(k, scanners::optional_numeric_params(source, k));
                let k = skip(k, scanners::definition_body(source, k));
                skip(k, scanners::definition_body(source, k))
            }
            "verb" => scanners::verbatim(source, i).unwrap_or_else(|| {
                self.reporter
                    .token_error(token, "invalid verbatim command", Flags::default().suppress());
                i
            }),
            "url" => scanners::url(source, i).unwrap_or_else(|| {
                self.reporter
                    .token_error(token, "invalid url command", Flags::default().suppress());
                i
            }),
            "left" | "right" => self.sized_bracket(i),
            "(" | ")" | "[" | "]" if control.symbol => {
                let command = match name {
                    "(" => Command::OpenParen,
                    ")" => Command::CloseParen,
                    "[" => Command::OpenBracket,
                    _ => Command::CloseBracket,
                };
                self.push(Delimiter::new(command, token.clone()));
                i
            }
            "input" => scanners::filename_argument(source, i).unwrap_or(i),
            _ if math_mode::is_text_box(name) => {
                self.next_group = GroupHint::Text;
                i
            }
            "tag" => {
                let k = skip(i, scanners::optional_star(source, i));
                self.next_group = GroupHint::Text;
                k
            }
            "rotatebox" | "scalebox" | "feynmandiagram" | "tikz" => {
                let k = skip(i, scanners::optional_generic_params(source, i));
                let k = skip(k, scanners::definition_body(source, k));
                self.next_group = GroupHint::Text;
                k
            }
            "resizebox" => {
                let k = skip(i, scanners::optional_generic_params(source, i));
                let k = skip(k, scanners::definition_body(source, k));
                let k = skip(k, scanners::definition_body(source, k));
                self.next_group = GroupHint::Text;
                k
            }
            "DeclareMathOperator" => {
                let k = skip(i, scanners::definition_body(source, i));
                skip(k, scanners::definition_body(source, k))
            }
            "DeclarePairedDelimiter" => {
                let k = skip(i, scanners::definition_body(source, i));
                let k = skip(k, scanners::definition_body(source, k));
                skip(k, scanners::definition_body(source, k))
            }
            _ if math_mode::is_greek_letter(name) => {
                if self.environments.math_mode().is_outside() {
                    self.reporter.token_error(
                        token,
                        format!("\\{} must be inside math mode", name),
                        Flags::default().math(),
                    );
                }
                i
            }
            _ if math_mode::is_sectioning(name) => {
                if self.environments.math_mode().is_inside() {
                    self.reporter.token_error(
                        token,
                        format!("\\{} used inside math mode", name),
                        Flags::default().math(),
                    );
                    self.environments.reset_math_mode();
                }
                i
            }
            _ if math_mode::is_plain_macro(name) => {
                self.next_group = GroupHint::Unknown;
                i
            }
            _ => i,
        }
    }

    /// `\begin{name}` and `\end{name}`.
    fn environment(&mut self, i: usize) -> usize {
        let source = self.source;
        let token = &source.tokens[i];
        let command = if token.control_name() == Some("begin") {
            Command::Begin
        } else {
            Command::End
        };

        if let Some((name, close)) = scanners::environment_name(source, i) {
            let close_token = source.tokens[close].clone();
            self.push(Delimiter::environment(command, name, token.clone(), close_token));
            return close;
        }

        // Report as much of the malformed command as can be read, up to the
        // first whitespace in the name.
        let open = source.tokens.get(i + 1).filter(|t| t.is(TokenKind::OpenBrace));
        match open {
            Some(open) => {
                let end = match source.tokens.get(i + 2).filter(|t| t.is(TokenKind::Text)) {
                    Some(text) => partial_name_end(source, text),
                    None => open.end(),
                };
                let shown = source.text.get(token.start()..end).unwrap_or_default();
                self.reporter.token_error_to(
                    token,
                    end,
                    format!("invalid environment command {}", shown),
                    Flags::default().suppress(),
                );
            }
            None => {
                self.reporter
                    .token_error(token, "invalid environment command", Flags::default().suppress());
            }
        }
        i
    }

    /// `\left` and `\right`, which must be followed by a delimiter.
    fn sized_bracket(&mut self, i: usize) -> usize {
        let source = self.source;
        let token = &source.tokens[i];
        let valid = match source.tokens.get(i + 1) {
            Some(next) if next.is(TokenKind::Text) => source
                .slice(next)
                .chars()
                .next()
                .is_some_and(|c| BRACKETS.contains(c)),
            Some(next) if next.is_control_symbol() => next
                .control_name()
                .and_then(|n| n.chars().next())
                .is_some_and(|c| BRACKETS.contains(c)),
            // \left\langle, \right\rfloor...
            Some(next) if next.is(TokenKind::Backslash) => true,
            _ => false,
        };

        if !valid {
            self.reporter
                .token_error(token, "invalid bracket command", Flags::default().suppress());
            return i;
        }
        let command = if token.control_name() == Some("left") {
            Command::Left
        } else {
            Command::Right
        };
        self.push(Delimiter::new(command, token.clone()));
        i + 1
    }
}

/// Advances to `found` when a scanner matched.
fn skip(current: usize, found: Option<usize>) -> usize {
    found.unwrap_or(current)
}

fn partial_name_end(source: &Tokenized<'_>, text: &Token) -> usize {
    source
        .slice(text)
        .char_indices()
        .find(|&(_, c)| matches!(c, ' ' | '\t' | '\r' | '\n'))
        .map_or(text.end(), |(idx, _)| text.start() + idx)
}
