use super::{Command, Context, Delimiter, DelimiterId, DocumentTree};
use crate::math_mode::{self, EnvironmentClass, MathMode};
use crate::reporter::{ErrorReporter, Flags};
use texlint_syntax::{LinePositionTable, Span};

/// Tracks open environments, groups and math shifts.
///
/// ## Algorithm
///
/// Delimiters are pushed in document order. Openers push a frame on the
/// [`DocumentTree`] stack with a math mode decided from the enclosing frame;
/// closers try to pop a matching frame. When a closer does not match, the
/// machine reports the mismatch and applies a few recovery heuristics so a
/// single typo does not cascade into an error on every later line:
///
/// 1. A closer that matches a frame discarded earlier (the *invalid list*)
///    consumes that entry silently.
/// 2. If the open frame ranks below the closer (a `{` left open inside an
///    environment), the frame is discarded and the match retried.
/// 3. If the frame below the top has the closer's name, both are closed.
/// 4. Otherwise the open frame is moved to the invalid list.
///
/// Inside a verbatim environment everything is ignored until the matching
/// `\end`.
#[derive(Debug, Default)]
pub struct Environments {
    delimiters: Vec<Delimiter>,
    tree: DocumentTree,
    invalid: Vec<DelimiterId>,
    document_closed: Option<DelimiterId>,
    in_verbatim: bool,
    verbatim_spans: Vec<Span>,
}

impl Environments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: DelimiterId) -> &Delimiter {
        &self.delimiters[id.0]
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    /// Byte ranges covered by closed verbatim environments.
    pub fn verbatim_spans(&self) -> &[Span] {
        &self.verbatim_spans
    }

    fn current(&self) -> Option<&Delimiter> {
        self.tree.current_delimiter().map(|id| self.get(id))
    }

    /// The math mode of the innermost open frame.
    pub fn math_mode(&self) -> MathMode {
        self.current().map_or(MathMode::Outside, |d| d.math_mode)
    }

    /// True when the innermost open frame is a `{` group.
    pub fn inside_group(&self) -> bool {
        self.current().is_some_and(|d| d.command == Command::OpenGroup)
    }

    /// Records `delimiter` and applies its transition.
    pub fn push(&mut self, mut delimiter: Delimiter, reporter: &mut ErrorReporter<'_>) {
        if delimiter.name().is_some_and(math_mode::is_verbatim_environment) {
            delimiter.verbatim = true;
        }
        let id = DelimiterId(self.delimiters.len());
        self.delimiters.push(delimiter);
        self.update(id, reporter);
    }

    fn update(&mut self, id: DelimiterId, reporter: &mut ErrorReporter<'_>) {
        let command = self.get(id).command;
        if self.in_verbatim {
            if command == Command::End {
                self.end_verbatim(id);
            }
            return;
        }
        match command {
            Command::Begin | Command::OpenGroup | Command::Left => {
                if self.get(id).verbatim {
                    self.in_verbatim = true;
                }
                let mode = self.resolve_mode(id, reporter);
                self.delimiters[id.0].math_mode = mode;
                self.tree.open(id);
            }
            Command::OpenParen | Command::OpenBracket => self.begin_math(id, reporter),
            Command::Dollar | Command::DoubleDollar => self.toggle_math(id, reporter),
            Command::End
            | Command::CloseParen
            | Command::CloseBracket
            | Command::CloseGroup
            | Command::Right => self.close(id, reporter),
        }
    }

    fn end_verbatim(&mut self, id: DelimiterId) {
        let Some(open) = self.tree.current_delimiter() else {
            return;
        };
        if self.get(open).name != self.get(id).name {
            return;
        }
        self.in_verbatim = false;
        self.tree.close(Some(id));
        let span = Span::new(self.get(open).token.start(), self.get(id).token.start());
        log::debug!("verbatim region {}..{}", span.start, span.end);
        self.verbatim_spans.push(span);
    }

    /// Decides the math mode of an opening `\begin`, `{` or `\left`,
    /// reporting environments used in the wrong mode.
    fn resolve_mode(&mut self, id: DelimiterId, reporter: &mut ErrorReporter<'_>) -> MathMode {
        let current = self.math_mode();
        let this = self.get(id);
        match this.command {
            Command::OpenGroup => math_mode::group_mode(current, this.hint),
            Command::Left => {
                if current.is_outside() {
                    reporter.env_error_from(
                        this,
                        "\\left can only be used in math mode",
                        Flags::default().math(),
                    );
                }
                current
            }
            Command::Begin => {
                let name = this.name().unwrap_or_default();
                match math_mode::classify_environment(name) {
                    EnvironmentClass::OutsideOnly => {
                        self.leave_math_for(id, current, reporter);
                        MathMode::Outside
                    }
                    EnvironmentClass::MathOnly => {
                        if current.is_outside() {
                            reporter.env_error_from(
                                this,
                                format!("{} not inside math mode", name),
                                Flags::default().math(),
                            );
                        }
                        current
                    }
                    EnvironmentClass::MathStarting => {
                        self.leave_math_for(id, current, reporter);
                        MathMode::Inside(id)
                    }
                    EnvironmentClass::Unknown => MathMode::Unknown,
                }
            }
            _ => current,
        }
    }

    /// Reports a text-level environment opened inside math and unwinds the
    /// math region.
    fn leave_math_for(&mut self, id: DelimiterId, current: MathMode, reporter: &mut ErrorReporter<'_>) {
        let Some(opener) = current.opener() else {
            return;
        };
        let this = self.get(id);
        let open = self.get(opener);
        reporter.env_error_from_to(
            open,
            this,
            format!("{} used inside {}", this.name().unwrap_or_default(), open.describe()),
            Flags::default().suppress().at_start().math(),
        );
        self.reset_math_mode();
    }

    /// Pops frames up to and including the one that opened the current math
    /// region.
    pub fn reset_math_mode(&mut self) {
        let target = self.math_mode().opener();
        while let Some(popped) = self.tree.close(None) {
            if Some(popped) == target {
                break;
            }
        }
    }

    fn begin_math(&mut self, id: DelimiterId, reporter: &mut ErrorReporter<'_>) {
        if let Some(opener) = self.math_mode().opener() {
            let this = self.get(id);
            reporter.env_error_from(
                this,
                format!(
                    "{} used inside existing math mode {}",
                    this.describe(),
                    self.get(opener).describe()
                ),
                Flags::default().suppress().at_start().math(),
            );
        }
        self.delimiters[id.0].math_mode = MathMode::Inside(id);
        self.tree.open(id);
    }

    /// `$` and `$$` both open and close math.
    fn toggle_math(&mut self, id: DelimiterId, reporter: &mut ErrorReporter<'_>) {
        let (closes, in_math) = match self.current() {
            Some(open) => (open.closed_by(self.get(id)), open.math_mode.is_inside()),
            None => (false, false),
        };
        if closes {
            self.tree.close(Some(id));
        } else if in_math {
            self.close(id, reporter);
        } else {
            self.delimiters[id.0].math_mode = MathMode::Inside(id);
            self.tree.open(id);
        }
    }

    fn close(&mut self, id: DelimiterId, reporter: &mut ErrorReporter<'_>) {
        loop {
            let Some(last) = self.tree.current_delimiter() else {
                self.report_unexpected(id, reporter);
                return;
            };

            if self.get(last).closed_by(self.get(id)) {
                self.tree.close(Some(id));
                let this = self.get(id);
                if this.command == Command::End
                    && this.name() == Some("document")
                    && self.document_closed.is_none()
                {
                    self.document_closed = Some(id);
                }
                return;
            }

            let matched = self
                .invalid
                .iter()
                .position(|&open| self.get(open).closed_by(self.get(id)));
            if let Some(pos) = matched {
                self.invalid.remove(pos);
                return;
            }

            self.report_mismatch(last, id, reporter);

            if outranked(self.get(last).command, self.get(id).command) {
                self.tree.close(None);
                self.invalid.push(last);
                continue;
            }

            let lookback = self
                .tree
                .previous_delimiter()
                .is_some_and(|prev| self.get(prev).name == self.get(id).name);
            if lookback {
                self.tree.close(None);
                self.tree.close(Some(id));
            } else {
                self.invalid.push(last);
            }
            return;
        }
    }

    fn report_unexpected(&self, id: DelimiterId, reporter: &mut ErrorReporter<'_>) {
        let this = self.get(id);
        match self.document_closed {
            Some(doc) => {
                let doc = self.get(doc);
                reporter.env_error_from_to(
                    doc,
                    this,
                    format!(
                        "\\end{{{}}} is followed by unexpected content",
                        doc.name().unwrap_or_default()
                    ),
                    Flags::default().info().at_start(),
                );
            }
            None => {
                reporter.env_error_to(
                    this,
                    format!("unexpected {}", this.describe()),
                    Flags::default(),
                );
            }
        }
    }

    fn report_mismatch(&self, last: DelimiterId, id: DelimiterId, reporter: &mut ErrorReporter<'_>) {
        let open = self.get(last);
        let this = self.get(id);
        if open.command == Command::OpenGroup && this.command == Command::End {
            reporter.env_error_from_to(
                open,
                this,
                format!("unclosed {} found at {}", open.describe(), this.describe()),
                Flags::default().warning().suppress().at_start(),
            );
        } else if outranked(open.command, this.command) {
            reporter.env_error_from_to(
                open,
                this,
                format!("unclosed {} found at {}", open.describe(), this.describe()),
                Flags::default().suppress().at_start(),
            );
        } else {
            reporter.env_error_from_to(
                open,
                this,
                format!("unexpected {} after {}", this.describe(), open.describe()),
                Flags::default(),
            );
        }
    }

    /// Pops every frame left open at the end of the document and drops
    /// token diagnostics that fall inside verbatim regions.
    pub fn finish(&mut self, reporter: &mut ErrorReporter<'_>) {
        while self.tree.depth() > 0 {
            let Some(id) = self.tree.close(None) else {
                break;
            };
            let open = self.get(id);
            if open.command == Command::OpenGroup {
                reporter.env_error_from(open, "unclosed group {", Flags::default().warning());
            } else {
                reporter.env_error_from(
                    open,
                    format!("unclosed {}", open.describe()),
                    Flags::default(),
                );
            }
        }
        reporter.ignore_within(&self.verbatim_spans);
    }

    /// Math regions of the document, outermost first.
    pub fn contexts(&self, lines: &LinePositionTable) -> Vec<Context> {
        self.tree.contexts(&self.delimiters, lines)
    }
}

/// True when `open` ranks strictly below `close`. Unranked delimiters never
/// outrank or get outranked.
fn outranked(open: Command, close: Command) -> bool {
    match (open.precedence(), close.precedence()) {
        (Some(open), Some(close)) => open < close,
        _ => false,
    }
}
