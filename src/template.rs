use crate::{
    error::ImportError,
    normalize::{
        eq_case, eq_relaxed, extract_age_number, is_unnamed, is_unnamed_strict, norm,
        normalize_row_length,
    },
    schema::{self, CanonicalRow, CUSTOM_REQUIRED, LEGACY_HEADERS, NEW_HEADERS},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateMatcher {
    MainTemplateEmptyCols,
    ExcelMergedWithUnnamed,
    New,
    Legacy,
}

/// Try order. Custom exports come before the fixed schemas and the two custom
/// matchers keep their historical order since they map rows differently.
pub const DEFAULT_TEMPLATE_ORDER: [TemplateMatcher; 4] = [
    TemplateMatcher::MainTemplateEmptyCols,
    TemplateMatcher::ExcelMergedWithUnnamed,
    TemplateMatcher::New,
    TemplateMatcher::Legacy,
];

impl TemplateMatcher {
    pub fn name(self) -> &'static str {
        match self {
            TemplateMatcher::MainTemplateEmptyCols => "MAIN_TEMPLATE_EMPTY_COLS",
            TemplateMatcher::ExcelMergedWithUnnamed => "EXCEL_MERGED_WITH_UNNAMED",
            TemplateMatcher::New => "NEW",
            TemplateMatcher::Legacy => "LEGACY",
        }
    }

    pub fn mode(self) -> String {
        self.name().to_lowercase()
    }

    pub fn is_custom(self) -> bool {
        matches!(
            self,
            TemplateMatcher::MainTemplateEmptyCols | TemplateMatcher::ExcelMergedWithUnnamed
        )
    }

    pub fn recognize(self, header: &[String]) -> Option<String> {
        match self {
            TemplateMatcher::MainTemplateEmptyCols => {
                let present: Vec<String> = header
                    .iter()
                    .map(|h| h.trim())
                    .filter(|h| !h.is_empty() && !is_unnamed(h))
                    .map(str::to_lowercase)
                    .collect();
                has_required(&present).then(|| self.custom_message())
            }
            TemplateMatcher::ExcelMergedWithUnnamed => {
                let present: Vec<String> = header
                    .iter()
                    .map(|h| h.trim())
                    .filter(|h| !is_unnamed_strict(h))
                    .map(str::to_lowercase)
                    .collect();
                has_required(&present).then(|| self.custom_message())
            }
            TemplateMatcher::New => {
                let ok = header.len() == NEW_HEADERS.len()
                    && NEW_HEADERS.iter().zip(header).all(|(e, g)| eq_case(e, g));
                ok.then(|| "Detected NEW template.".to_string())
            }
            TemplateMatcher::Legacy => {
                if header.len() != LEGACY_HEADERS.len() {
                    return None;
                }
                if LEGACY_HEADERS.iter().zip(header).all(|(e, g)| eq_case(e, g)) {
                    return Some(
                        "Detected LEGACY template. Mapping “Cause Of Admission” → “Diagnosis”."
                            .to_string(),
                    );
                }
                if LEGACY_HEADERS.iter().zip(header).all(|(e, g)| eq_relaxed(e, g)) {
                    return Some(
                        "Detected LEGACY template (relaxed). Mapping “Cause Of Admission” → “Diagnosis”."
                            .to_string(),
                    );
                }
                None
            }
        }
    }

    pub fn map_row(self, row: &[String], header: &[String]) -> CanonicalRow {
        match self {
            TemplateMatcher::MainTemplateEmptyCols => map_named(row, header),
            TemplateMatcher::ExcelMergedWithUnnamed => map_merged(row, header),
            TemplateMatcher::New => {
                let cells = normalize_row_length(row, schema::CANONICAL_WIDTH);
                let mut out = schema::empty_row();
                for (slot, cell) in out.iter_mut().zip(cells) {
                    *slot = cell;
                }
                out[schema::AGE] = extract_age_number(&out[schema::AGE]);
                out
            }
            TemplateMatcher::Legacy => map_legacy(row),
        }
    }

    fn custom_message(self) -> String {
        format!("Detected custom template: {}.", self.name())
    }
}

fn has_required(present: &[String]) -> bool {
    CUSTOM_REQUIRED
        .iter()
        .all(|need| present.iter().any(|p| p == need))
}

const CUSTOM_SLOTS: [(&str, usize); 9] = [
    ("patient code", schema::CODE),
    ("patient name", schema::NAME),
    ("patient age", schema::AGE),
    ("room", schema::ROOM),
    ("cause of admission", schema::DIAGNOSIS),
    ("admitting provider", schema::PROVIDER),
    ("diet", schema::DIET),
    ("isolation", schema::ISOLATION),
    ("comments", schema::COMMENTS),
];

fn lowered(header: &[String]) -> Vec<String> {
    header.iter().map(|h| h.trim().to_lowercase()).collect()
}

fn map_named(row: &[String], header: &[String]) -> CanonicalRow {
    let hl = lowered(header);
    let idx_for = |key: &str| {
        hl.iter()
            .position(|h| !h.is_empty() && !is_unnamed(h) && h == key)
    };

    let mut out = schema::empty_row();
    for (key, slot) in CUSTOM_SLOTS {
        out[slot] = idx_for(key)
            .and_then(|i| row.get(i))
            .cloned()
            .unwrap_or_default();
    }
    out[schema::AGE] = extract_age_number(&out[schema::AGE]);
    out
}

fn map_merged(row: &[String], header: &[String]) -> CanonicalRow {
    let hl = lowered(header);
    let idxs_for = |key: &str| {
        let mut idxs = Vec::new();
        for (i, h) in hl.iter().enumerate() {
            if h != key {
                continue;
            }
            idxs.push(i);
            idxs.extend(
                (i + 1..hl.len()).take_while(|&j| is_unnamed_strict(&hl[j])),
            );
        }
        idxs
    };
    let first_non_empty = |idxs: Vec<usize>| {
        idxs.into_iter()
            .filter_map(|i| row.get(i))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
            .to_string()
    };

    let mut out = schema::empty_row();
    for (key, slot) in CUSTOM_SLOTS {
        out[slot] = first_non_empty(idxs_for(key));
    }
    out[schema::AGE] = extract_age_number(&out[schema::AGE]);
    out
}

fn map_legacy(row: &[String]) -> CanonicalRow {
    let r = normalize_row_length(row, LEGACY_HEADERS.len());
    let mut out = schema::empty_row();
    out[schema::CODE] = r[0].clone();
    out[schema::NAME] = r[1].clone();
    out[schema::AGE] = extract_age_number(&r[2]);
    out[schema::ROOM] = r[3].clone();
    out[schema::DIAGNOSIS] = r[5].clone();
    out[schema::PROVIDER] = r[4].clone();
    out[schema::DIET] = r[6].clone();
    out[schema::ISOLATION] = r[7].clone();
    out[schema::COMMENTS] = r[8].clone();
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub matcher: TemplateMatcher,
    pub message: String,
}

impl Validated {
    pub fn mode(&self) -> String {
        self.matcher.mode()
    }
}

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    order: Vec<TemplateMatcher>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_ORDER.to_vec())
    }
}

impl TemplateRegistry {
    pub fn new(order: Vec<TemplateMatcher>) -> Self {
        Self { order }
    }

    /// Custom matchers see the raw header (BOM already removed); the fixed
    /// schemas compare trimmed cells.
    pub fn validate(&self, raw_header: &[String]) -> Result<Validated, ImportError> {
        let header: Vec<String> = raw_header.iter().map(|h| norm(h)).collect();
        for &matcher in &self.order {
            let input = if matcher.is_custom() { raw_header } else { &header[..] };
            if let Some(message) = matcher.recognize(input) {
                debug!(template = matcher.name(), "header recognized");
                return Ok(Validated { matcher, message });
            }
        }
        Err(ImportError::HeaderMismatch { got: header })
    }
}

pub fn validate_headers(header: &[String]) -> Result<Validated, ImportError> {
    TemplateRegistry::new(vec![TemplateMatcher::New, TemplateMatcher::Legacy]).validate(header)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Result<Validated, ImportError>> for ValidationResult {
    fn from(res: &Result<Validated, ImportError>) -> Self {
        match res {
            Ok(v) => Self {
                ok: true,
                mode: Some(v.mode()),
                message: Some(v.message.clone()),
                error: None,
            },
            Err(e) => Self {
                ok: false,
                mode: None,
                message: None,
                error: Some(e.to_string()),
            },
        }
    }
}
