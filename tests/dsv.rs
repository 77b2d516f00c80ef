use rounds_import::dsv::{detect_delimiter, strip_bom, tokenize, Delimiter};

#[test]
fn tie_prefers_comma() {
    assert_eq!(detect_delimiter("a,b;c"), Delimiter::Comma);
}

#[test]
fn highest_count_wins() {
    assert_eq!(detect_delimiter("a\tb\tc,d"), Delimiter::Tab);
    assert_eq!(detect_delimiter("a;b;c\nx,y,z,w,v"), Delimiter::Semicolon);
}

#[test]
fn no_candidate_defaults_to_comma() {
    assert_eq!(detect_delimiter("just one column"), Delimiter::Comma);
    assert_eq!(detect_delimiter(""), Delimiter::Comma);
}

#[test]
fn only_first_line_is_inspected() {
    assert_eq!(detect_delimiter("a\tb\r\nc,d,e,f"), Delimiter::Tab);
}

#[test]
fn doubled_quotes_and_embedded_delimiter() {
    let rows = tokenize("\"a,\"\"b\"\"\",c", Delimiter::Comma);
    assert_eq!(rows, vec![vec!["a,\"b\"".to_string(), "c".to_string()]]);
}

#[test]
fn quoted_newline_stays_in_field() {
    let rows = tokenize("code;note\nP1;\"line one\nline two\"\n", Delimiter::Semicolon);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], "line one\nline two");
}

#[test]
fn cells_are_not_trimmed() {
    let rows = tokenize("  a \t b", Delimiter::Tab);
    assert_eq!(rows, vec![vec!["  a ".to_string(), " b".to_string()]]);
}

#[test]
fn final_delimiter_keeps_the_row() {
    let rows = tokenize("a,b\nc,", Delimiter::Comma);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], vec!["c".to_string(), String::new()]);
}

#[test]
fn empty_input_has_no_rows() {
    assert!(tokenize("", Delimiter::Comma).is_empty());
}

#[test]
fn crlf_and_lone_cr_end_rows() {
    let rows = tokenize("a,b\r\nc,d\re,f", Delimiter::Comma);
    assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"], vec!["e", "f"]]);
}

#[test]
fn trailing_newline_adds_no_phantom_row() {
    assert_eq!(tokenize("a,b\n", Delimiter::Comma).len(), 1);
}

#[test]
fn bom_is_stripped_once() {
    assert_eq!(strip_bom("\u{FEFF}abc"), "abc");
    assert_eq!(strip_bom("abc"), "abc");
}
