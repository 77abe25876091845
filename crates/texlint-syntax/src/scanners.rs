//! Lookahead scanners for TeX command arguments.
//!
//! Each scanner takes the tokenized source and the index `k` of the command
//! token and returns the index of the *last* token belonging to the
//! argument, or `None` when the argument shape is not present. Callers
//! continue their token walk from the returned index, so the argument's
//! contents are never interpreted as structure.
//!
//! Scanners that look at raw characters (optional parameters, `\def`
//! parameter text, `\verb`, `\url`) keep a token index in step with the
//! character position so they can still report a token index.

use crate::{Token, TokenKind, Tokenized};
use once_cell::sync::Lazy;
use regex::Regex;

/// `[2]`, `[1][default]`, `[2][a][b]` as a single text token.
static NUMERIC_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[\d+\](\[[^\]]*\])*\s*$").expect("valid regex"));

/// `[origin=c]`, `[a][b]` as a single text token.
static GENERIC_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\[[^\]]*\])+\s*$").expect("valid regex"));

fn is_line_break(c: char) -> bool {
    c == '\r' || c == '\n'
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn text_token<'a>(source: &Tokenized<'a>, idx: usize) -> Option<&'a str> {
    source
        .tokens
        .get(idx)
        .filter(|t| t.is(TokenKind::Text))
        .map(|t| source.slice(t))
}

/// Keeps a token index in step with a raw character scan.
///
/// `k` always names the last token whose start is at or before the
/// character most recently passed to [`TokenCursor::advance`].
struct TokenCursor<'t> {
    tokens: &'t [Token],
    k: usize,
}

impl<'t> TokenCursor<'t> {
    fn new(tokens: &'t [Token], k: usize) -> Self {
        Self { tokens, k }
    }

    fn advance(&mut self, offset: usize) {
        while self
            .tokens
            .get(self.k + 1)
            .is_some_and(|next| offset >= next.start())
        {
            self.k += 1;
        }
    }
}

/// Reads the control sequence argument of `\newcommand\foo` or
/// `\newcommand{\foo}`. With `allow_star`, a `*` directly after the command
/// is skipped first.
pub fn single_argument(source: &Tokenized<'_>, k: usize, allow_star: bool) -> Option<usize> {
    let mut k = k;
    if allow_star && text_token(source, k + 1) == Some("*") {
        k += 1;
    }

    let tokens = &source.tokens;
    match (tokens.get(k + 1), tokens.get(k + 2), tokens.get(k + 3)) {
        (Some(open), _, _) if open.is(TokenKind::Backslash) => Some(k + 1),
        (Some(open), Some(name), Some(close))
            if open.is(TokenKind::OpenBrace)
                && name.is(TokenKind::Backslash)
                && close.is(TokenKind::CloseBrace) =>
        {
            Some(k + 3)
        }
        _ => None,
    }
}

/// Reads `\let\foo\bar` or `\let\foo=\bar`.
pub fn let_binding(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    let tokens = &source.tokens;
    if !tokens.get(k + 1)?.is(TokenKind::Backslash) {
        return None;
    }
    let second = tokens.get(k + 2)?;
    if second.is(TokenKind::Backslash) {
        return Some(k + 2);
    }
    let third = tokens.get(k + 3)?;
    if text_token(source, k + 2) == Some("=") && third.is(TokenKind::Backslash) {
        Some(k + 3)
    } else {
        None
    }
}

/// Joins consecutive whitespace-free text tokens and `_` tokens starting at
/// `from`. Returns the joined name and the index of the first token that is
/// not part of it.
pub fn accumulate_name(source: &Tokenized<'_>, from: usize) -> (String, usize) {
    let mut name = String::new();
    let mut j = from;
    while let Some(tok) = source.tokens.get(j) {
        match tok.kind {
            TokenKind::Text => {
                let piece = source.slice(tok);
                if piece.chars().any(char::is_whitespace) {
                    break;
                }
                name.push_str(piece);
            }
            TokenKind::Underscore => name.push('_'),
            _ => break,
        }
        j += 1;
    }
    (name, j)
}

/// Reads a braced environment name, `{name}` or `{name_with_underscores}`,
/// following the token at `k`. Returns the name and the index of the
/// closing brace.
pub fn environment_name(source: &Tokenized<'_>, k: usize) -> Option<(String, usize)> {
    let tokens = &source.tokens;
    if !tokens.get(k + 1)?.is(TokenKind::OpenBrace) {
        return None;
    }
    let name = text_token(source, k + 2)?;
    if tokens.get(k + 3).is_some_and(|t| t.is(TokenKind::CloseBrace)) {
        return Some((name.to_string(), k + 3));
    }

    let (name, j) = accumulate_name(source, k + 2);
    if tokens.get(j).is_some_and(|t| t.is(TokenKind::CloseBrace)) {
        Some((name, j))
    } else {
        None
    }
}

/// Reads the `{name}` argument of `\newenvironment` and friends.
pub fn name_argument(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    environment_name(source, k).map(|(_, end)| end)
}

/// Reads an unbraced filename such as `\input chapter_one.tex`.
pub fn filename_argument(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    let (name, j) = accumulate_name(source, k + 1);
    if name.is_empty() { None } else { Some(j - 1) }
}

/// Reads optional parameters up to a definition body, as in
/// `\newcommand{\foo}[2]{...}` or `\newenvironment{x}[1][\default]{...}`.
///
/// Simple `[N][...]` text is matched directly. Otherwise bracket groups are
/// skipped character by character up to the first `{` at bracket depth
/// zero; a line break inside an open bracket gives up.
pub fn optional_numeric_params(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    let next = source.tokens.get(k + 1)?;
    if text_token(source, k + 1).is_some_and(|text| NUMERIC_PARAMS.is_match(text)) {
        return Some(k + 1);
    }

    let mut cursor = TokenCursor::new(&source.tokens, k);
    let mut depth = 0i32;
    for (idx, c) in source.text[next.start()..].char_indices() {
        let offset = next.start() + idx;
        cursor.advance(offset);
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ => {}
        }
        if depth == 0 && c == '{' {
            return Some(cursor.k.saturating_sub(1).max(k));
        }
        if depth > 0 && is_line_break(c) {
            return None;
        }
    }
    None
}

/// Reads `[...]` groups held entirely in the next text token, as in
/// `\rotatebox[origin=c]{90}`.
pub fn optional_generic_params(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    text_token(source, k + 1)
        .filter(|text| GENERIC_PARAMS.is_match(text))
        .map(|_| k + 1)
}

/// Reads one or more `*` in the next text token, as in `\tag*`.
pub fn optional_star(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    let text = text_token(source, k + 1)?.trim_end();
    if !text.is_empty() && text.chars().all(|c| c == '*') {
        Some(k + 1)
    } else {
        None
    }
}

/// Skips the parameter text of a `\def`, e.g. `#1.#2(#3)` in
/// `\def\foo#1.#2(#3){...}`. `k` is the index of the defined name.
pub fn def_optional_params(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    let name = source.tokens.get(k)?;
    let mut cursor = TokenCursor::new(&source.tokens, k);
    for (idx, c) in source.text[name.end()..].char_indices() {
        cursor.advance(name.end() + idx);
        if c == '{' {
            return Some(cursor.k.saturating_sub(1).max(k));
        }
        if is_line_break(c) {
            return None;
        }
    }
    None
}

/// Reads a balanced `{...}` argument after the token at `k`, allowing
/// leading whitespace. Returns the index of the matching close brace, or
/// one past the last token when the body is never closed.
pub fn definition_body(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    let tokens = &source.tokens;
    let mut k = k + 1;
    while let Some(text) = text_token(source, k) {
        if !text.chars().all(is_blank) {
            return None;
        }
        k += 1;
    }

    if !tokens.get(k)?.is(TokenKind::OpenBrace) {
        return None;
    }
    let mut depth = 1usize;
    while depth > 0 {
        k += 1;
        let Some(tok) = tokens.get(k) else { break };
        match tok.kind {
            TokenKind::CloseBrace => depth -= 1,
            TokenKind::OpenBrace => depth += 1,
            _ => {}
        }
    }
    Some(k)
}

/// Reads a `\verb|...|` or `\verb*|...|` span. The delimiter is any
/// character; the span must close on the same line.
pub fn verbatim(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    let verb = source.tokens.get(k)?;
    let mut pos = verb.end();
    if source.text[pos..].starts_with('*') {
        pos += 1;
    }
    let delimiter = source.text[pos..].chars().next()?;
    pos += delimiter.len_utf8();

    let mut cursor = TokenCursor::new(&source.tokens, k);
    for (idx, c) in source.text[pos..].char_indices() {
        cursor.advance(pos + idx);
        if c == delimiter {
            return Some(cursor.k);
        }
        if is_line_break(c) {
            return None;
        }
    }
    None
}

/// Reads a `\url{...}` (with nested braces) or `\url|...|` argument on a
/// single line.
pub fn url(source: &Tokenized<'_>, k: usize) -> Option<usize> {
    let url = source.tokens.get(k)?;
    let mut pos = url.end();
    let open = source.text[pos..].chars().next()?;
    let close = if open == '{' { '}' } else { open };

    let mut k = k;
    if source.tokens.get(k + 1).is_some_and(|t| t.start() == pos) {
        k += 1;
    }
    pos += open.len_utf8();

    let mut cursor = TokenCursor::new(&source.tokens, k);
    let mut depth = 1usize;
    for (idx, c) in source.text[pos..].char_indices() {
        cursor.advance(pos + idx);
        if c == close {
            depth -= 1;
        } else if c == open {
            depth += 1;
        }
        if depth == 0 {
            return Some(cursor.k);
        }
        if is_line_break(c) {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    /// Index of the first control sequence called `name`.
    fn find(source: &Tokenized<'_>, name: &str) -> usize {
        source
            .tokens
            .iter()
            .position(|t| t.control_name() == Some(name))
            .unwrap()
    }

    fn slice_at<'a>(source: &Tokenized<'a>, idx: usize) -> &'a str {
        source.slice(&source.tokens[idx])
    }

    #[test]
    fn test_single_argument_forms() {
        let source = tokenize(r"\newcommand\foo{x}").unwrap();
        let k = find(&source, "newcommand");
        assert_eq!(single_argument(&source, k, false), Some(k + 1));

        let source = tokenize(r"\newcommand{\foo}{x}").unwrap();
        assert_eq!(single_argument(&source, 0, false), Some(3));

        let source = tokenize(r"\newcommand*{\foo}{x}").unwrap();
        assert_eq!(single_argument(&source, 0, true), Some(4));
        assert_eq!(single_argument(&source, 0, false), None);
    }

    #[test]
    fn test_let_binding() {
        let source = tokenize(r"\let\a\b").unwrap();
        assert_eq!(let_binding(&source, 0), Some(2));
        let source = tokenize(r"\let\a=\b").unwrap();
        assert_eq!(let_binding(&source, 0), Some(3));
        let source = tokenize(r"\let{x}").unwrap();
        assert_eq!(let_binding(&source, 0), None);
    }

    #[test]
    fn test_environment_name_with_underscores() {
        let source = tokenize(r"\begin{new_major_theorem}").unwrap();
        let (name, end) = environment_name(&source, 0).unwrap();
        assert_eq!(name, "new_major_theorem");
        assert!(source.tokens[end].is(TokenKind::CloseBrace));
    }

    #[test]
    fn test_environment_name_rejects_whitespace() {
        let source = tokenize("\\end{bar\n\\end{foo}").unwrap();
        assert_eq!(environment_name(&source, 0), None);
    }

    #[test]
    fn test_filename_argument() {
        let source = tokenize(r"\input{chapter}").unwrap();
        assert_eq!(filename_argument(&source, 0), None);

        let source = tokenize(r"\input foo_bar.tex\relax").unwrap();
        let end = filename_argument(&source, 0).unwrap();
        assert_eq!(slice_at(&source, end), "bar.tex");
        assert_eq!(source.tokens[end + 1].control_name(), Some("relax"));
    }

    #[test]
    fn test_optional_numeric_params_fast_path() {
        let source = tokenize(r"\newcommand{\foo}[2][x]{#1}").unwrap();
        assert_eq!(optional_numeric_params(&source, 3), Some(4));
    }

    #[test]
    fn test_optional_numeric_params_generic() {
        let source = tokenize(r"\newenvironment{x}[1][\myname]{a}{b}").unwrap();
        let end = optional_numeric_params(&source, 3).unwrap();
        assert_eq!(slice_at(&source, end), "]");
        assert!(source.tokens[end + 1].is(TokenKind::OpenBrace));
    }

    #[test]
    fn test_optional_numeric_params_without_params() {
        let source = tokenize(r"\renewcommand{\left}{\bgroup}").unwrap();
        assert_eq!(optional_numeric_params(&source, 3), Some(3));
    }

    #[test]
    fn test_optional_numeric_params_line_break() {
        let source = tokenize("\\newcommand{\\foo}[\\bar\n]{x}").unwrap();
        assert_eq!(optional_numeric_params(&source, 3), None);
    }

    #[test]
    fn test_optional_generic_and_star() {
        let source = tokenize(r"\rotatebox[origin=c]{90}").unwrap();
        assert_eq!(optional_generic_params(&source, 0), Some(1));
        let source = tokenize(r"\rotatebox{90}").unwrap();
        assert_eq!(optional_generic_params(&source, 0), None);

        let source = tokenize(r"\tag*{x}").unwrap();
        assert_eq!(optional_star(&source, 0), Some(1));
        let source = tokenize(r"\tag{x}").unwrap();
        assert_eq!(optional_star(&source, 0), None);
    }

    #[test]
    fn test_def_optional_params() {
        let source = tokenize(r"\def\foo#1.#2(#3){body}").unwrap();
        let name = find(&source, "foo");
        let end = def_optional_params(&source, name).unwrap();
        assert!(source.tokens[end + 1].is(TokenKind::OpenBrace));

        let source = tokenize("\\def\\foo#1\n{body}").unwrap();
        assert_eq!(def_optional_params(&source, 1), None);
    }

    #[test]
    fn test_definition_body() {
        let source = tokenize(r"\foo {a{b}c}d").unwrap();
        let end = definition_body(&source, 0).unwrap();
        assert!(source.tokens[end].is(TokenKind::CloseBrace));
        assert_eq!(slice_at(&source, end + 1), "d");

        let source = tokenize(r"\foo x{a}").unwrap();
        assert_eq!(definition_body(&source, 0), None);

        let source = tokenize(r"\foo{a{b}").unwrap();
        assert_eq!(definition_body(&source, 0), Some(source.tokens.len()));
    }

    #[test]
    fn test_verbatim() {
        let source = tokenize(r"\verb|{}()^_@$x\hello| and more").unwrap();
        let end = verbatim(&source, 0).unwrap();
        assert_eq!(slice_at(&source, end), "| and more");

        let source = tokenize(r"\verb*!x! y").unwrap();
        assert!(verbatim(&source, 0).is_some());

        let source = tokenize("\\verb|abc\ndef|").unwrap();
        assert_eq!(verbatim(&source, 0), None);
    }

    #[test]
    fn test_url() {
        let source = tokenize(r"\url{http://a.b/{c}} more").unwrap();
        let end = url(&source, 0).unwrap();
        assert!(source.tokens[end].is(TokenKind::CloseBrace));
        assert_eq!(slice_at(&source, end + 1), " more");

        let source = tokenize(r"\url|http://x.y/| z").unwrap();
        assert!(url(&source, 0).is_some());

        let source = tokenize("\\url{http://x\n}").unwrap();
        assert_eq!(url(&source, 0), None);
    }
}
