use rounds_import::{config::Config, postprocess::clean_text};

#[test]
fn newlines_and_nbsp_are_normalized() {
    let cfg = Config::default();
    let cleaned = clean_text(&cfg, "P1,\u{00A0}John\r\nP2,Jane\rP3,Ali");
    assert_eq!(cleaned, "P1, John\nP2,Jane\nP3,Ali");
}

#[test]
fn sanitizes_control_chars() {
    let cfg = Config::default();
    let cleaned = clean_text(&cfg, "Alpha\u{0002}Beta\u{0084}\nLine\tTabbed");

    assert!(!cleaned.contains('\u{0002}'));
    assert!(!cleaned.contains('\u{0084}'));
    assert!(cleaned.contains("AlphaBeta"));
    assert!(cleaned.contains('\n'));
    assert!(cleaned.contains('\t'));
}

#[test]
fn bare_carriage_returns_survive_without_newline_normalization() {
    let mut cfg = Config::default();
    cfg.postprocess.normalize_newlines = false;
    let cleaned = clean_text(&cfg, "P1,Ann\rP2,Bob\u{0007}");
    assert_eq!(cleaned, "P1,Ann\rP2,Bob");
}
