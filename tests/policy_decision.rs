use rounds_import::{
    config::Config,
    policy::{decide, Reason},
    session::ExtractionMode,
};

#[test]
fn rich_text_layer_is_kept() {
    let cfg = Config::default();
    let text = "Patient Code, Patient Name, Patient Age\nP1, John Smith, 70\nP2, Jane Doe, 64";
    let d = decide(&cfg, Some(text), false);
    assert_eq!(d.extraction, ExtractionMode::TextLayer);
    assert_eq!(d.reason, Reason::TextLayerOk);
}

#[test]
fn thin_text_layer_falls_back_to_ocr() {
    let cfg = Config::default();
    let d = decide(&cfg, Some("  page 1 \n\n  "), false);
    assert_eq!(d.extraction, ExtractionMode::Ocr);
    assert_eq!(d.reason, Reason::TextLayerTooShort);
    assert_eq!(d.text_chars, Some(5));
}

#[test]
fn forced_ocr_wins() {
    let mut cfg = Config::default();
    let d = decide(&cfg, None, true);
    assert_eq!(d.extraction, ExtractionMode::Ocr);
    assert_eq!(d.reason, Reason::Forced);

    cfg.pdf.force_ocr = true;
    let d = decide(&cfg, Some(&"x".repeat(500)), false);
    assert_eq!(d.reason, Reason::Forced);
}
