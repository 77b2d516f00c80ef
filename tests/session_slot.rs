use rounds_import::{
    error::ImportError,
    schema::{self, CanonicalRow},
    session::{ImportMode, ImportSession, SessionSlot},
    template::TemplateMatcher,
};

fn session_with(code: &str) -> ImportSession {
    let mut row: CanonicalRow = schema::empty_row();
    row[schema::CODE] = code.to_string();
    ImportSession::new(
        ImportMode::Template {
            matcher: TemplateMatcher::New,
        },
        "ok".to_string(),
        Vec::new(),
        vec![row],
        "sha".to_string(),
    )
}

#[test]
fn later_parse_wins_over_slower_earlier_one() {
    let slot = SessionSlot::new();
    let first = slot.begin();
    let second = slot.begin();

    slot.complete(second, Ok(session_with("B"))).unwrap();
    let err = slot.complete(first, Ok(session_with("A"))).unwrap_err();
    assert!(matches!(err, ImportError::StaleParse { ticket: 1, current: 2 }));

    let rows = slot.consume_validated_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][schema::CODE], "B");
}

#[test]
fn failed_parse_leaves_slot_empty() {
    let slot = SessionSlot::new();
    let t = slot.begin();
    slot.complete(t, Ok(session_with("A"))).unwrap();

    let t = slot.begin();
    assert!(slot.snapshot().is_none());
    let err = slot.complete(t, Err(ImportError::EmptyFile)).unwrap_err();
    assert_eq!(err.user_message(), "Empty file.");
    assert!(slot.consume_validated_rows().is_empty());
}

#[test]
fn consumed_rows_are_independent_of_the_slot() {
    let slot = SessionSlot::new();
    let t = slot.begin();
    slot.complete(t, Ok(session_with("A"))).unwrap();

    let mut rows = slot.consume_validated_rows();
    rows[0][schema::CODE] = "changed".to_string();
    assert_eq!(slot.consume_validated_rows()[0][schema::CODE], "A");
}
