use crate::schema::{LEGACY_HEADERS, NEW_HEADERS};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{}", header_mismatch_text(.got))]
    HeaderMismatch { got: Vec<String> },

    #[error("empty file")]
    EmptyFile,

    #[error("failed to read/parse file: {0}")]
    Parse(String),

    #[error("no table detected in PDF")]
    NoTableDetected,

    #[error("failed to parse PDF: {0}")]
    PdfFailed(String),

    #[error("input exceeds max_input_file_bytes: {bytes} > {limit}")]
    InputTooLarge { bytes: u64, limit: u64 },

    #[error("stale parse result (ticket {ticket}, current {current})")]
    StaleParse { ticket: u64, current: u64 },
}

impl ImportError {
    pub fn user_message(&self) -> String {
        match self {
            ImportError::HeaderMismatch { .. } => self.to_string(),
            ImportError::EmptyFile => "Empty file.".to_string(),
            ImportError::Parse(_) | ImportError::InputTooLarge { .. } => {
                "Failed to read/parse file.".to_string()
            }
            ImportError::NoTableDetected => {
                "Could not detect table rows from this PDF.".to_string()
            }
            ImportError::PdfFailed(_) => {
                "Failed to parse this PDF. Try changing OCR setting or export as CSV.".to_string()
            }
            ImportError::StaleParse { .. } => {
                "A newer import replaced this one; showing the latest file.".to_string()
            }
        }
    }
}

fn header_mismatch_text(got: &[String]) -> String {
    format!(
        "Header mismatch. Expected either:\n- NEW: {}\n- LEGACY: {}\nGot: {}",
        NEW_HEADERS.join(" | "),
        LEGACY_HEADERS.join(" | "),
        got.join(" | ")
    )
}
