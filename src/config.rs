use crate::template::{TemplateMatcher, DEFAULT_TEMPLATE_ORDER};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub import: Import,
    #[serde(default)]
    pub pdf: Pdf,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub tools: Tools,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub postprocess: Postprocess,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Import {
    pub template_order: Vec<TemplateMatcher>,
    pub preview_rows: usize,
    pub default_section: String,
    pub default_symptoms_notes: String,
}
impl Default for Import {
    fn default() -> Self {
        Self {
            template_order: DEFAULT_TEMPLATE_ORDER.to_vec(),
            preview_rows: 10,
            default_section: "".into(),
            default_symptoms_notes: "{}".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pdf {
    /// Below this many non-whitespace characters the text layer is treated as absent.
    pub min_text_chars: usize,
    pub line_tolerance: f32,
    pub column_gap: f32,
    pub min_cells: usize,
    pub copied_cells: usize,
    pub default_section: String,
    pub force_ocr: bool,
}
impl Default for Pdf {
    fn default() -> Self {
        Self {
            min_text_chars: 50,
            line_tolerance: 3.0,
            column_gap: 12.0,
            min_cells: 3,
            copied_cells: 9,
            default_section: "Default".into(),
            force_ocr: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ocr {
    pub lang: String,
    pub allowed_langs: Vec<String>,
    pub scale: f32,
    pub psm: u8,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            lang: "eng".into(),
            allowed_langs: vec!["eng".into(), "ara".into()],
            scale: 2.0,
            psm: 6,
        }
    }
}

impl Ocr {
    pub fn dpi(&self) -> u32 {
        (72.0 * self.scale.max(0.5)).round() as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tools {
    pub pdfinfo: String,
    pub pdftotext: String,
    pub pdftoppm: String,
    pub tesseract: String,
    pub page_timeout_seconds: u64,
}
impl Default for Tools {
    fn default() -> Self {
        Self {
            pdfinfo: "pdfinfo".into(),
            pdftotext: "pdftotext".into(),
            pdftoppm: "pdftoppm".into(),
            tesseract: "tesseract".into(),
            page_timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    pub max_input_file_bytes: u64,
    pub max_pdf_pages: u32,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_file_bytes: 50 * 1024 * 1024,
            max_pdf_pages: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub out_dir: String,
    pub work_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            work_dir: ".rounds-import-work".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Postprocess {
    pub normalize_unicode: bool,
    pub normalize_newlines: bool,
    pub control_chars_to_sanitize: Vec<u8>,
}
impl Default for Postprocess {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            normalize_newlines: true,
            control_chars_to_sanitize: (0u8..32).chain([127]).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub write_csv: bool,
    pub write_records_json: bool,
    pub write_report_json: bool,
    pub csv_filename: String,
    pub records_filename: String,
    pub report_filename: String,
    pub template_filename: String,
    pub print_summary: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_csv: true,
            write_records_json: true,
            write_report_json: true,
            csv_filename: "rows.csv".into(),
            records_filename: "records.json".into(),
            report_filename: "report.json".into(),
            template_filename: "palliative_rounds_template.csv".into(),
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
