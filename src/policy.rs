use crate::{config::Config, session::ExtractionMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Forced,
    TextLayerOk,
    TextLayerTooShort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub extraction: ExtractionMode,
    pub reason: Reason,
    pub text_chars: Option<usize>,
}

/// Chooses between the embedded text layer and OCR. `text_layer` is `None`
/// when extraction was skipped because OCR is forced.
pub fn decide(cfg: &Config, text_layer: Option<&str>, force_ocr: bool) -> PolicyDecision {
    let text_chars = text_layer.map(|t| t.chars().filter(|c| !c.is_whitespace()).count());

    if force_ocr || cfg.pdf.force_ocr {
        return PolicyDecision {
            extraction: ExtractionMode::Ocr,
            reason: Reason::Forced,
            text_chars,
        };
    }

    match text_chars {
        Some(n) if n >= cfg.pdf.min_text_chars => PolicyDecision {
            extraction: ExtractionMode::TextLayer,
            reason: Reason::TextLayerOk,
            text_chars,
        },
        _ => PolicyDecision {
            extraction: ExtractionMode::Ocr,
            reason: Reason::TextLayerTooShort,
            text_chars,
        },
    }
}
