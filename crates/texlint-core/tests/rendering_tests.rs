use expect_test::expect;
use texlint_core::validate;

fn render(text: &str) -> String {
    validate(text).unwrap().to_string()
}

#[test]
fn test_render_malformed_end() {
    let actual = render(concat!(
        "this is text\n",
        "\\begin{foo}\n",
        "\\begin{bar}\n",
        "this is foo bar baz\n",
        "\\end{bar\n",
        "\\end{foo}\n",
        "this is more text\n",
    ));
    expect![[r#"
        4:0: error: invalid environment command \end{bar
        4:4: warning: unclosed open group { found at \end{foo}
        5:9: error: unexpected \end{foo} after \begin{bar}
    "#]]
    .assert_eq(&actual);
}

#[test]
fn test_render_text_environment_in_math() {
    let actual = render("\\begin{equation}\nx\n\\begin{itemize}\n\\end{itemize}\n\\end{equation}\n");
    expect![[r#"
        0:0: error: itemize used inside \begin{equation}
        4:14: error: unexpected \end{equation}
    "#]]
    .assert_eq(&actual);
}

#[test]
fn test_render_unclosed_at_end() {
    let actual = render("\\begin{document}\n$x\n");
    expect![[r#"
        1:0: error: unclosed $
        0:0: error: unclosed \begin{document}
    "#]]
    .assert_eq(&actual);
}

#[test]
fn test_render_clean() {
    expect![[""]].assert_eq(&render("\\begin{document}\n$x^2$\n\\end{document}\n"));
}

#[test]
fn test_json_shape() {
    let report = validate("$x^2\n").unwrap();
    let value = serde_json::to_value(&report).unwrap();

    let diagnostic = &value["diagnostics"][0];
    assert_eq!(diagnostic["message"], "unclosed $");
    assert_eq!(diagnostic["severity"], "error");
    for key in [
        "startRow",
        "startCol",
        "endRow",
        "endCol",
        "suppressIfEditing",
        "mathMode",
        "anchorAtStart",
    ] {
        assert!(diagnostic.get(key).is_some(), "missing {}", key);
    }

    let context = &value["contexts"][0];
    assert_eq!(context["type"], "math");
    assert_eq!(context["range"]["start"]["row"], 0);
    assert!(context["range"].get("end").is_none());
}
