use rounds_import::{
    config::Config,
    engine::{Engine, TextFragment, ToolDiag},
    error::ImportError,
    pipeline::{read_table, ImportOptions, Pipeline},
    probe::probe_input,
    schema::{self, NEW_HEADERS},
    session::{ImportMode, SessionSlot},
    template::TemplateMatcher,
};
use std::path::Path;

struct NoPdf;

impl Engine for NoPdf {
    fn doctor(&self) -> anyhow::Result<Vec<ToolDiag>> {
        Ok(Vec::new())
    }
    fn page_count(&self, _input: &Path) -> anyhow::Result<u32> {
        anyhow::bail!("not a pdf")
    }
    fn text_fragments(&self, _input: &Path, _page: u32) -> anyhow::Result<Vec<TextFragment>> {
        anyhow::bail!("not a pdf")
    }
    fn ocr_page(&self, _input: &Path, _page: u32, _lang: &str) -> anyhow::Result<String> {
        anyhow::bail!("not a pdf")
    }
}

fn pipeline() -> Pipeline<NoPdf> {
    Pipeline::new(&Config::default(), NoPdf)
}

const LEGACY_LINE: &str = "Patient Code,Patient Name,Patient Age,Room,Admitting Provider,Cause Of Admission,Diet,Isolation,Comments";

#[test]
fn legacy_file_end_to_end() {
    let text = format!("{LEGACY_LINE}\nP1,John,70,101,DrA,Pneumonia,Reg,Standard,stable\n");
    let session = pipeline().import_text(text.as_bytes()).unwrap();
    let rows = session.consume_validated_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][schema::CODE], "P1");
    assert_eq!(rows[0][schema::DIAGNOSIS], "Pneumonia");
    assert_eq!(rows[0][schema::SECTION], "");
    assert_eq!(rows[0][schema::COMMENTS], "stable");
}

#[test]
fn legacy_file_through_fixed_schemas_only() {
    let mut cfg = Config::default();
    cfg.import.template_order = vec![TemplateMatcher::New, TemplateMatcher::Legacy];
    let p = Pipeline::new(&cfg, NoPdf);
    let text = format!("{LEGACY_LINE}\nP1,John,70 Y,101,DrA,Pneumonia,Reg,Standard,stable");
    let session = p.import_text(text.as_bytes()).unwrap();
    assert_eq!(session.mode.label(), "legacy");
    assert_eq!(session.rows()[0][schema::DIAGNOSIS], "Pneumonia");
    assert_eq!(session.rows()[0][schema::AGE], "70");
}

#[test]
fn blank_lines_are_dropped() {
    let text = format!(
        "{}\nP1,Ann,50\n\n , ,\u{00A0}\nP2,Bob,61\n\n",
        NEW_HEADERS.join(",")
    );
    let session = pipeline().import_text(text.as_bytes()).unwrap();
    assert_eq!(session.mode, ImportMode::Template { matcher: TemplateMatcher::New });
    assert_eq!(session.row_count(), 2);
    assert!(session.rows().iter().all(|r| r.len() == schema::CANONICAL_WIDTH));
    assert_eq!(session.rows()[1][schema::NAME], "Bob");
}

#[test]
fn bom_and_semicolons() {
    let text = format!(
        "\u{FEFF}{}\r\nP7;\"Doe; Jane\";45 years;2A;Dx;ICU;DrZ;Soft;None;;\"pain,nausea\";{{}};K",
        NEW_HEADERS.join(";")
    );
    let session = pipeline().import_text(text.as_bytes()).unwrap();
    let row = &session.rows()[0];
    assert_eq!(row[schema::NAME], "Doe; Jane");
    assert_eq!(row[schema::AGE], "45");
    assert_eq!(row[schema::SECTION], "ICU");
    assert_eq!(row[schema::SYMPTOMS], "pain,nausea");
    assert_eq!(row[schema::SYMPTOMS_NOTES], "{}");
}

#[test]
fn tab_separated_custom_export() {
    let text = "\tPatient Code\tPatient Name\tPatient Age\tRoom\tAdmitting Provider\tCause Of Admission\tDiet\tIsolation\tComments\tUnnamed: 10\n\
                \tP3\tOmar\t77\t9\tDrQ\tCOPD\tReg\tDroplet\tNIV\t\n";
    let session = pipeline().import_text(text.as_bytes()).unwrap();
    assert_eq!(session.mode.label(), "main_template_empty_cols");
    let row = &session.rows()[0];
    assert_eq!(row[schema::CODE], "P3");
    assert_eq!(row[schema::DIAGNOSIS], "COPD");
    assert_eq!(row[schema::COMMENTS], "NIV");
}

#[test]
fn empty_file_is_reported() {
    let err = pipeline().import_text(b"").unwrap_err();
    assert!(matches!(err, ImportError::EmptyFile));
    assert_eq!(err.user_message(), "Empty file.");
}

#[test]
fn header_only_file_has_no_rows() {
    let session = pipeline()
        .import_text(NEW_HEADERS.join(",").as_bytes())
        .unwrap();
    assert_eq!(session.row_count(), 0);
    assert_eq!(session.preview(10).note(), "No data rows detected. Mode: NEW.");
}

#[test]
fn unknown_header_is_rejected() {
    let err = pipeline().import_text(b"Name,Age\nAnn,50\n").unwrap_err();
    assert!(matches!(err, ImportError::HeaderMismatch { .. }));
    assert!(err.user_message().starts_with("Header mismatch. Expected either:"));
}

#[test]
fn consumed_rows_are_independent() {
    let text = format!("{}\nP1,Ann,50", NEW_HEADERS.join(","));
    let session = pipeline().import_text(text.as_bytes()).unwrap();
    let mut copy = session.consume_validated_rows();
    copy[0][schema::NAME] = "changed".to_string();
    assert_eq!(session.rows()[0][schema::NAME], "Ann");
}

#[test]
fn preview_shows_first_rows_only() {
    let mut text = NEW_HEADERS.join(",");
    for i in 0..12 {
        text.push_str(&format!("\nP{i},Name {i},{}", 40 + i));
    }
    let session = pipeline().import_text(text.as_bytes()).unwrap();
    let preview = session.preview(10);
    assert_eq!(preview.rows.len(), 10);
    assert_eq!(preview.row_count, 12);
    assert_eq!(preview.header_row, NEW_HEADERS.to_vec());
    assert_eq!(preview.note(), "Showing first 10 rows (12 total). Mode: NEW.");
}

#[test]
fn read_table_strips_bom_from_header() {
    let table = read_table("\u{FEFF}a\tb\n1\t2".as_bytes()).unwrap();
    assert_eq!(table.header, vec!["a", "b"]);
    assert_eq!(table.data.len(), 1);
    assert!(!table.lossy);
}

#[test]
fn invalid_utf8_is_decoded_lossily() {
    let mut bytes = NEW_HEADERS.join(",").into_bytes();
    bytes.extend_from_slice(b"\nP1,Caf\xe9,50");
    let session = pipeline().import_text(&bytes).unwrap();
    assert_eq!(session.row_count(), 1);
    assert_eq!(session.warnings.len(), 1);
}

#[test]
fn reparse_replaces_slot_contents() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.csv");
    let bad = dir.path().join("bad.csv");
    std::fs::write(&good, format!("{LEGACY_LINE}\nP1,John,70,101,DrA,Flu,Reg,None,\n")).unwrap();
    std::fs::write(&bad, "Name,Age\nAnn,3\n").unwrap();

    let p = pipeline();
    let slot = SessionSlot::new();
    let opts = ImportOptions::default();

    p.import_into(&slot, &good, &opts).unwrap();
    assert_eq!(slot.consume_validated_rows().len(), 1);

    let err = p.import_into(&slot, &bad, &opts).unwrap_err();
    assert!(matches!(err, ImportError::HeaderMismatch { .. }));
    assert!(slot.consume_validated_rows().is_empty());
}

#[test]
fn probed_bytes_are_the_ones_imported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rounds.csv");
    std::fs::write(&path, format!("{LEGACY_LINE}\nP1,John,70,101,DrA,Flu,Reg,None,\n")).unwrap();

    let cfg = Config::default();
    let (probe, bytes) = probe_input(&cfg, &path).unwrap();
    // the file changes after it was read
    std::fs::write(&path, format!("{LEGACY_LINE}\nP2,Jane,60,102,DrB,Flu,Reg,None,\nP3,Omar,50,103,DrC,Flu,Reg,None,\n")).unwrap();

    let session = pipeline()
        .import_probed(&path, &probe, &bytes, &ImportOptions::default())
        .unwrap();
    assert_eq!(session.row_count(), 1);
    assert_eq!(session.rows()[0][schema::CODE], "P1");
    assert_eq!(session.source_sha256, probe.sha256);
}
