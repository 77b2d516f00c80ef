use crate::{
    error::ImportError,
    policy::PolicyDecision,
    schema::{CanonicalRow, NEW_HEADERS},
    template::TemplateMatcher,
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    TextLayer,
    Ocr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ImportMode {
    Template { matcher: TemplateMatcher },
    Pdf { extraction: ExtractionMode, lang: String },
}

impl ImportMode {
    pub fn label(&self) -> String {
        match self {
            ImportMode::Template { matcher } => matcher.mode(),
            ImportMode::Pdf { extraction: ExtractionMode::TextLayer, .. } => "pdf".to_string(),
            ImportMode::Pdf { extraction: ExtractionMode::Ocr, .. } => "pdf_ocr".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfSummary {
    pub pages: u32,
    pub decision: PolicyDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSession {
    pub mode: ImportMode,
    pub message: String,
    pub source_header: Vec<String>,
    rows: Vec<CanonicalRow>,
    pub warnings: Vec<String>,
    pub source_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfSummary>,
}

impl ImportSession {
    pub fn new(
        mode: ImportMode,
        message: String,
        source_header: Vec<String>,
        rows: Vec<CanonicalRow>,
        source_sha256: String,
    ) -> Self {
        Self {
            mode,
            message,
            source_header,
            rows,
            warnings: Vec::new(),
            source_sha256,
            pdf: None,
        }
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn consume_validated_rows(&self) -> Vec<CanonicalRow> {
        self.rows.clone()
    }

    pub fn used_ocr(&self) -> bool {
        matches!(
            self.mode,
            ImportMode::Pdf {
                extraction: ExtractionMode::Ocr,
                ..
            }
        )
    }

    pub fn preview(&self, max_rows: usize) -> Preview {
        Preview {
            header_row: NEW_HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: self.rows.iter().take(max_rows).cloned().collect(),
            row_count: self.rows.len(),
            mode: self.mode.label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preview {
    pub header_row: Vec<String>,
    pub rows: Vec<CanonicalRow>,
    pub row_count: usize,
    pub mode: String,
}

impl Preview {
    pub fn note(&self) -> String {
        let mode = self.mode.to_uppercase();
        if self.row_count > self.rows.len() {
            format!(
                "Showing first {} rows ({} total). Mode: {}.",
                self.rows.len(),
                self.row_count,
                mode
            )
        } else if self.row_count == 0 {
            format!("No data rows detected. Mode: {mode}.")
        } else {
            format!("{} data rows. Mode: {}.", self.row_count, mode)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct SlotState {
    issued: u64,
    current: Option<ImportSession>,
}

/// Holds the latest import for a caller. Parses take a ticket when they start;
/// a completion whose ticket is older than the newest issued one is rejected,
/// so the slot always reflects the parse that started last.
#[derive(Debug, Default)]
pub struct SessionSlot {
    state: Mutex<SlotState>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        let mut st = self.lock();
        st.issued += 1;
        st.current = None;
        debug!(ticket = st.issued, "parse started");
        Ticket(st.issued)
    }

    pub fn complete(
        &self,
        ticket: Ticket,
        outcome: Result<ImportSession, ImportError>,
    ) -> Result<(), ImportError> {
        let mut st = self.lock();
        if ticket.0 != st.issued {
            warn!(ticket = ticket.0, current = st.issued, "discarding stale parse");
            return Err(ImportError::StaleParse {
                ticket: ticket.0,
                current: st.issued,
            });
        }
        match outcome {
            Ok(session) => {
                st.current = Some(session);
                Ok(())
            }
            Err(err) => {
                st.current = None;
                Err(err)
            }
        }
    }

    pub fn consume_validated_rows(&self) -> Vec<CanonicalRow> {
        self.lock()
            .current
            .as_ref()
            .map(ImportSession::consume_validated_rows)
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Option<ImportSession> {
        self.lock().current.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
