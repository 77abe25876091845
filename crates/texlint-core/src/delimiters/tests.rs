use super::*;
use crate::math_mode::GroupHint;
use crate::reporter::{Diagnostic, ErrorReporter, Severity};
use texlint_syntax::{tokenize, Position, TokenKind, Tokenized};

/// Pushes one delimiter per token of `source`, naming `\begin`/`\end` after
/// the following text token. Only structural tokens are used.
fn drive(source: &Tokenized<'_>) -> (Environments, Vec<Diagnostic>) {
    let mut reporter = ErrorReporter::new(source);
    let mut environments = Environments::new();
    let tokens = &source.tokens;
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let delimiter = match (token.kind, token.control_name()) {
            (TokenKind::OpenBrace, _) => Some(Delimiter::group(token.clone(), GroupHint::Inherit)),
            (TokenKind::CloseBrace, _) => Some(Delimiter::new(Command::CloseGroup, token.clone())),
            (TokenKind::Dollar, _) => Some(Delimiter::new(Command::Dollar, token.clone())),
            (_, Some(cmd @ ("begin" | "end"))) => {
                let name = source.slice(&tokens[i + 2]).to_string();
                let command = if cmd == "begin" { Command::Begin } else { Command::End };
                let close = tokens[i + 3].clone();
                let delimiter = Delimiter::environment(command, name, token.clone(), close);
                i += 3;
                Some(delimiter)
            }
            _ => None,
        };
        if let Some(delimiter) = delimiter {
            environments.push(delimiter, &mut reporter);
        }
        i += 1;
    }
    environments.finish(&mut reporter);
    (environments, reporter.finish(10))
}

fn messages(text: &str) -> Vec<String> {
    let source = tokenize(text).unwrap();
    drive(&source).1.into_iter().map(|d| d.message).collect()
}

#[test]
fn test_precedence_order() {
    assert!(Command::OpenGroup.precedence() < Command::Left.precedence());
    assert!(Command::Left.precedence() < Command::Dollar.precedence());
    assert_eq!(Command::DoubleDollar.precedence(), Command::Begin.precedence());
    assert_eq!(Command::OpenBracket.precedence(), None);
}

#[test]
fn test_closed_by() {
    let source = tokenize(r"\begin{a}\end{a}\end{b}").unwrap();
    let t = &source.tokens;
    let begin = Delimiter::environment(Command::Begin, "a".into(), t[0].clone(), t[3].clone());
    let end_a = Delimiter::environment(Command::End, "a".into(), t[4].clone(), t[7].clone());
    let end_b = Delimiter::environment(Command::End, "b".into(), t[8].clone(), t[11].clone());
    assert!(begin.closed_by(&end_a));
    assert!(!begin.closed_by(&end_b));
    assert_eq!(begin.describe(), r"\begin{a}");
    assert_eq!(end_b.end_token(), &t[11]);
}

#[test]
fn test_balanced_environments() {
    assert!(messages(r"\begin{a}{x}\begin{b}\end{b}\end{a}").is_empty());
}

#[test]
fn test_extra_begin_closes_through_lookback() {
    // \begin{b} is never closed; \end{a} matches the frame below it.
    assert_eq!(
        messages(r"\begin{a}\begin{b}\end{a}"),
        vec![r"unexpected \end{a} after \begin{b}"]
    );
}

#[test]
fn test_extra_end_keeps_frame_open() {
    // \end{b} does not match; \begin{a} stays open for the later \end{a}.
    let found = messages(r"\begin{a}\end{b}\end{a}");
    assert_eq!(found, vec![r"unexpected \end{b} after \begin{a}"]);
}

#[test]
fn test_invalid_list_consumes_closer() {
    // The `{` is discarded at \end{a}; its `}` then matches the discarded
    // frame instead of producing a second diagnostic.
    let found = messages(r"\begin{b}\begin{a}{\end{a}}\end{b}");
    assert_eq!(found, vec![r"unclosed open group { found at \end{a}"]);
}

#[test]
fn test_unclosed_group_at_end() {
    let source = tokenize("{\n{}").unwrap();
    let (_, diagnostics) = drive(&source);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "unclosed group {");
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!((diagnostics[0].end_row, diagnostics[0].end_col), (1, 2));
}

#[test]
fn test_unexpected_close() {
    let source = tokenize("ab}").unwrap();
    let (_, diagnostics) = drive(&source);
    assert_eq!(diagnostics[0].message, "unexpected close group }");
    assert_eq!((diagnostics[0].start_row, diagnostics[0].start_col), (0, 0));
    assert_eq!(diagnostics[0].end_col, 3);
}

#[test]
fn test_content_after_document() {
    let source = tokenize("\\begin{document}\n\\end{document}\n}").unwrap();
    let (_, diagnostics) = drive(&source);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        r"\end{document} is followed by unexpected content"
    );
    assert_eq!(diagnostics[0].severity, Severity::Info);
    assert!(diagnostics[0].anchor_at_start);
}

#[test]
fn test_verbatim_ignores_contents() {
    let source = tokenize("\\begin{verbatim}\n} \\end{x} $\n\\end{verbatim}").unwrap();
    let (environments, diagnostics) = drive(&source);
    assert!(diagnostics.is_empty());
    assert_eq!(environments.verbatim_spans().len(), 1);
    assert_eq!(environments.tree().depth(), 0);
}

#[test]
fn test_tree_records_nesting() {
    let source = tokenize(r"\begin{a}{x}{y}\end{a}").unwrap();
    let (environments, _) = drive(&source);
    let tree = environments.tree();
    let root_children = tree.children(NodeId(0));
    assert_eq!(root_children.len(), 1);
    assert_eq!(tree.children(root_children[0]).len(), 2);
}

#[test]
fn test_contexts_stop_at_math() {
    let source = tokenize("{$a{b}$}\n$c").unwrap();
    let (environments, _) = drive(&source);
    let contexts = environments.contexts(&source.lines);
    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[0].range.start, Position::new(0, 1));
    assert_eq!(contexts[0].range.end, Some(Position::new(0, 7)));
    assert_eq!(contexts[1].range.end, None);
}
