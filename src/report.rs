use crate::{
    probe::ProbeInput,
    session::{ImportMode, ImportSession, PdfSummary},
    template::ValidationResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub input: ProbeInput,
    pub mode: String,
    pub row_count: usize,
    pub validation: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PdfSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_lang: Option<String>,
    pub warnings: Vec<String>,
    pub started: String,
    pub finished: String,
}

impl ImportReport {
    pub fn new(input: ProbeInput, session: &ImportSession, started: String, finished: String) -> Self {
        let ocr_lang = match &session.mode {
            ImportMode::Pdf { lang, .. } if session.used_ocr() => Some(lang.clone()),
            _ => None,
        };
        Self {
            input,
            mode: session.mode.label(),
            row_count: session.row_count(),
            validation: ValidationResult {
                ok: true,
                mode: Some(session.mode.label()),
                message: Some(session.message.clone()),
                error: None,
            },
            pdf: session.pdf.clone(),
            ocr_lang,
            warnings: session.warnings.clone(),
            started,
            finished,
        }
    }
}
