use rounds_import::{config::Config, template::DEFAULT_TEMPLATE_ORDER};

#[test]
fn parse_example_config() {
    let raw = include_str!("../rounds-import.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.import.template_order, DEFAULT_TEMPLATE_ORDER.to_vec());
    assert_eq!(cfg.pdf.min_text_chars, 50);
    assert_eq!(cfg.ocr.dpi(), 144);
    assert!(!cfg.paths.out_dir.is_empty());
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[logging]\nlevel = \"debug\"\njson = true\nwrite_to_file = false\nfile_path = \"\"\n")
        .expect("parse TOML");
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.pdf.default_section, "Default");
    assert_eq!(cfg.import.default_symptoms_notes, "{}");
}
