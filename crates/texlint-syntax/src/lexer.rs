use crate::{Comment, ControlWord, Position, Span, Token, TokenKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on scanner iterations for a single document.
pub const DEFAULT_MAX_TOKENS: usize = 100_000;

/// Characters with a TeX category other than "letter" or "other".
const SPECIAL: &[char] = &['\\', '{', '}', '$', '&', '#', '^', '_', '~', '%'];

/// Unrecoverable tokenizer faults. Any of these aborts the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("exceeded maximum token count of {limit}")]
    TokenLimitExceeded { limit: usize },
    #[error("unrecognised special character {character:?} at offset {offset}")]
    UnrecognizedCharacter { character: char, offset: usize },
    #[error("tokenizer did not advance past offset {offset}")]
    InternalProgress { offset: usize },
}

/// Maps line numbers to the byte offset of the line's first character.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinePositionTable {
    starts: Vec<usize>,
}

impl LinePositionTable {
    pub fn new() -> Self {
        Self { starts: vec![0] }
    }

    fn push(&mut self, line: usize, offset: usize) {
        if line == self.starts.len() {
            self.starts.push(offset);
        } else if line < self.starts.len() {
            self.starts[line] = offset;
        }
    }

    /// Offset of the first character of `line`, if that line was seen.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }

    /// Column of `offset` measured from the start of `line`.
    pub fn column(&self, line: usize, offset: usize) -> usize {
        offset.saturating_sub(self.line_start(line).unwrap_or(0))
    }

    /// Converts an absolute offset into a row/column pair.
    pub fn position(&self, offset: usize) -> Position {
        let row = match self.starts.binary_search(&offset) {
            Ok(row) => row,
            Err(next) => next.saturating_sub(1),
        };
        Position::new(row, self.column(row, offset))
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// The output of [`tokenize`]: tokens plus everything needed to map them
/// back onto the source.
#[derive(Debug, Clone)]
pub struct Tokenized<'a> {
    pub text: &'a str,
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
    pub lines: LinePositionTable,
    /// Zero-based number of the last line in the document.
    pub last_line: usize,
    /// Set when a `%novalidate` directive switched validation off entirely.
    pub novalidate: bool,
}

impl<'a> Tokenized<'a> {
    /// The source text covered by `token`.
    pub fn slice(&self, token: &Token) -> &'a str {
        self.text.get(token.start()..token.end()).unwrap_or("")
    }

    /// Row/column of the end of the document.
    pub fn end_position(&self) -> Position {
        Position::new(self.last_line, self.lines.column(self.last_line, self.text.len()))
    }
}

/// A tokenizer for TeX source.
///
/// ## Overview
///
/// The tokenizer walks the input with an explicit cursor, jumping from one
/// special character to the next:
///
/// - **Text**: every gap between two special characters becomes one token
/// - **Control sequences**: `\section` (letters only), followed by a skip of
///   trailing spaces, tabs and line breaks
/// - **Control symbols**: `\@`, `\%`, `\\` (exactly one non-letter)
/// - **Comments**: `%` through end of line, collected separately
/// - **Specials**: `{ } $ & # ^ _ ~` as single-character tokens
///
/// ## Directives
///
/// Comments starting with `novalidate` abort tokenization with no tokens at
/// all. `begin novalidate` and `end novalidate` bracket a region whose
/// special characters are not tokenized.
///
/// ## Positions
///
/// Offsets are bytes. Every line break passed over is recorded in the
/// [`LinePositionTable`], so tokens carry their starting line.
///
/// ## Examples
///
/// ```
/// use texlint_syntax::lexer::tokenize;
/// use texlint_syntax::TokenKind;
///
/// let source = tokenize("a^b\n\\alpha  x").unwrap();
/// let kinds: Vec<_> = source.tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![TokenKind::Text, TokenKind::Caret, TokenKind::Text, TokenKind::Backslash, TokenKind::Text]
/// );
/// assert_eq!(source.tokens[3].line, 1);
/// ```
pub struct Tokenizer<'a> {
    text: &'a str,
    /// Byte position of the next unread character.
    cursor: usize,
    line: usize,
    lines: LinePositionTable,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    checking_disabled: bool,
    last_special: Option<usize>,
    max_tokens: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_limit(text, DEFAULT_MAX_TOKENS)
    }

    pub fn with_limit(text: &'a str, max_tokens: usize) -> Self {
        Self {
            text,
            cursor: 0,
            line: 0,
            lines: LinePositionTable::new(),
            tokens: Vec::new(),
            comments: Vec::new(),
            checking_disabled: false,
            last_special: None,
            max_tokens,
        }
    }

    pub fn run(mut self) -> Result<Tokenized<'a>, TokenizeError> {
        let mut count = 0usize;
        loop {
            count += 1;
            if count > self.max_tokens {
                return Err(TokenizeError::TokenLimitExceeded {
                    limit: self.max_tokens,
                });
            }

            let Some(pos) = self.find_special() else {
                if self.cursor < self.text.len() {
                    self.push_text(self.cursor, self.text.len());
                    self.count_lines(self.cursor, self.text.len());
                }
                break;
            };

            if self.last_special.is_some_and(|prev| pos <= prev) {
                return Err(TokenizeError::InternalProgress { offset: pos });
            }
            self.last_special = Some(pos);

            if pos > self.cursor {
                self.push_text(self.cursor, pos);
            }
            self.count_lines(self.cursor, pos);
            self.cursor = pos + 1;

            let code = self.text[pos..].chars().next().unwrap_or('\0');
            if code == '%' {
                if self.comment(pos) {
                    log::debug!("novalidate directive at offset {pos}, skipping document");
                    return Ok(self.finish(true));
                }
            } else if self.checking_disabled {
                continue;
            } else if code == '\\' {
                self.control(pos);
            } else if let Some(kind) = TokenKind::from_special(code) {
                self.push(kind, pos, pos + 1, None);
            } else {
                return Err(TokenizeError::UnrecognizedCharacter {
                    character: code,
                    offset: pos,
                });
            }
        }
        Ok(self.finish(false))
    }

    fn finish(self, novalidate: bool) -> Tokenized<'a> {
        Tokenized {
            text: self.text,
            tokens: if novalidate { Vec::new() } else { self.tokens },
            comments: self.comments,
            lines: self.lines,
            last_line: self.line,
            novalidate,
        }
    }

    fn find_special(&self) -> Option<usize> {
        self.text[self.cursor.min(self.text.len())..]
            .find(SPECIAL)
            .map(|idx| idx + self.cursor)
    }

    /// Consumes a comment starting at `pos`. Returns `true` on `%novalidate`.
    fn comment(&mut self, pos: usize) -> bool {
        let newline = self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |idx| idx + self.cursor);
        let body = self.text[self.cursor..newline].trim_start_matches('%');

        if body.starts_with("novalidate") {
            return true;
        } else if !self.checking_disabled && body.starts_with("begin novalidate") {
            log::debug!("validation disabled from line {}", self.line);
            self.checking_disabled = true;
        } else if self.checking_disabled && body.starts_with("end novalidate") {
            log::debug!("validation re-enabled at line {}", self.line);
            self.checking_disabled = false;
        }

        self.comments.push(Comment {
            line: self.line,
            span: Span::new(pos, newline),
        });
        if newline < self.text.len() {
            self.cursor = newline + 1;
            self.new_line(self.cursor);
        } else {
            self.cursor = self.text.len();
        }
        false
    }

    fn control(&mut self, pos: usize) {
        let rest = &self.text[self.cursor..];
        let letters = rest.bytes().take_while(u8::is_ascii_alphabetic).count();

        if letters == 0 {
            let symbol = rest.chars().next();
            let end = self.cursor + symbol.map_or(0, char::len_utf8);
            let name = symbol.map(String::from).unwrap_or_default();
            self.push(TokenKind::Backslash, pos, end, Some(ControlWord { name, symbol: true }));
            if symbol == Some('\n') {
                self.new_line(end);
            }
            self.cursor = end;
        } else {
            let end = self.cursor + letters;
            let name = self.text[self.cursor..end].to_string();
            self.push(TokenKind::Backslash, pos, end, Some(ControlWord { name, symbol: false }));

            let mut skip = end;
            while let Some(b) = self.text.as_bytes().get(skip).copied() {
                if !matches!(b, b' ' | b'\t' | b'\r' | b'\n') {
                    break;
                }
                skip += 1;
                if b == b'\n' {
                    self.new_line(skip);
                }
            }
            self.cursor = skip;
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize, control: Option<ControlWord>) {
        self.tokens.push(Token {
            line: self.line,
            kind,
            span: Span::new(start, end),
            control,
        });
    }

    fn push_text(&mut self, start: usize, end: usize) {
        self.push(TokenKind::Text, start, end, None);
    }

    fn count_lines(&mut self, from: usize, to: usize) {
        for (idx, b) in self.text.as_bytes()[from..to].iter().enumerate() {
            if *b == b'\n' {
                self.new_line(from + idx + 1);
            }
        }
    }

    fn new_line(&mut self, offset: usize) {
        self.line += 1;
        self.lines.push(self.line, offset);
    }
}

/// Tokenizes `text` with the default token ceiling.
pub fn tokenize(text: &str) -> Result<Tokenized<'_>, TokenizeError> {
    Tokenizer::new(text).run()
}

pub fn tokenize_with_limit(text: &str, max_tokens: usize) -> Result<Tokenized<'_>, TokenizeError> {
    Tokenizer::with_limit(text, max_tokens).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        let source = tokenize(input).unwrap();
        source
            .tokens
            .iter()
            .map(|t| (t.kind, source.slice(t)))
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        let input = r"\section{Hello} % comment";
        assert_eq!(
            kinds(input),
            vec![
                (TokenKind::Backslash, "\\section"),
                (TokenKind::OpenBrace, "{"),
                (TokenKind::Text, "Hello"),
                (TokenKind::CloseBrace, "}"),
                (TokenKind::Text, " "),
            ]
        );
        let source = tokenize(input).unwrap();
        assert_eq!(source.comments.len(), 1);
        assert_eq!(source.comments[0].span, Span::new(16, input.len()));
    }

    #[test]
    fn test_control_symbol() {
        let source = tokenize(r"Wait 50\%").unwrap();
        let last = source.tokens.last().unwrap();
        assert_eq!(last.control_name(), Some("%"));
        assert!(last.is_control_symbol());
        assert_eq!(source.slice(last), "\\%");
    }

    #[test]
    fn test_control_sequence_consumes_trailing_whitespace() {
        let source = tokenize("\\foo  \n\t bar").unwrap();
        assert_eq!(source.tokens.len(), 2);
        assert_eq!(source.tokens[0].span, Span::new(0, 4));
        assert_eq!(source.tokens[1].line, 1);
        assert_eq!(source.slice(&source.tokens[1]), "bar");
        assert_eq!(source.lines.line_start(1), Some(7));
    }

    #[test]
    fn test_control_sequence_at_end_of_input() {
        let source = tokenize("x \\alpha").unwrap();
        let last = source.tokens.last().unwrap();
        assert_eq!(last.control_name(), Some("alpha"));
        assert!(last.is_control_word());
    }

    #[test]
    fn test_trailing_backslash() {
        let source = tokenize("x\\").unwrap();
        let last = source.tokens.last().unwrap();
        assert_eq!(last.control_name(), Some(""));
        assert_eq!(last.span, Span::new(1, 2));
    }

    #[test]
    fn test_text_tokens_are_not_merged() {
        // The comment splits the text into two separate tokens.
        assert_eq!(
            kinds("ab%c\nde"),
            vec![(TokenKind::Text, "ab"), (TokenKind::Text, "de")]
        );
    }

    #[test]
    fn test_specials() {
        let all: Vec<_> = kinds("&#^_~$").into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            all,
            vec![
                TokenKind::Ampersand,
                TokenKind::Hash,
                TokenKind::Caret,
                TokenKind::Underscore,
                TokenKind::Tilde,
                TokenKind::Dollar,
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let source = tokenize("a\nb\n{c}\n").unwrap();
        let lines: Vec<_> = source.tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![0, 2, 2, 2, 2]);
        assert_eq!(source.last_line, 3);
        assert_eq!(source.lines.position(5), Position::new(2, 1));
    }

    #[test]
    fn test_novalidate_yields_no_tokens() {
        let source = tokenize("\\begin{foo}\n%novalidate\n\\end{bar}").unwrap();
        assert!(source.novalidate);
        assert!(source.tokens.is_empty());
    }

    #[test]
    fn test_double_percent_novalidate() {
        let source = tokenize("text %%novalidate\n{").unwrap();
        assert!(source.tokens.is_empty());
    }

    #[test]
    fn test_begin_end_novalidate_region() {
        let input = "{\n%begin novalidate\n}}} $ \\foo\n%end novalidate\n}";
        let source = tokenize(input).unwrap();
        let specials: Vec<_> = source
            .tokens
            .iter()
            .filter(|t| !t.is(TokenKind::Text))
            .map(|t| t.kind)
            .collect();
        assert_eq!(specials, vec![TokenKind::OpenBrace, TokenKind::CloseBrace]);
    }

    #[test]
    fn test_token_limit() {
        let input = "{}".repeat(10);
        let err = tokenize_with_limit(&input, 5).unwrap_err();
        assert_eq!(err, TokenizeError::TokenLimitExceeded { limit: 5 });
    }

    #[test]
    fn test_multi_byte_text() {
        let source = tokenize("Émilie $x$").unwrap();
        assert_eq!(source.slice(&source.tokens[0]), "Émilie ");
        assert_eq!(source.tokens[1].start(), "Émilie ".len());
    }

    #[test]
    fn test_offsets_strictly_increasing() {
        let input = "\\begin{a}x_1 % c\n\\[ y \\] \\verb|z| }{";
        let source = tokenize(input).unwrap();
        for pair in source.tokens.windows(2) {
            assert!(pair[0].end() <= pair[1].start());
            assert!(pair[0].start() < pair[1].start());
        }
    }
}
