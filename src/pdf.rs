use crate::{
    config::Config,
    engine::{Engine, TextFragment},
    normalize::extract_age_number,
    policy::{self, PolicyDecision},
    postprocess,
    schema::{self, CanonicalRow},
    session::ExtractionMode,
};
use anyhow::{bail, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static HEADER_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)patient\s*code").expect("static header regex"));
static HEADER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)patient\s*name").expect("static header regex"));
static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("static gap regex"));

#[derive(Debug, Clone)]
pub struct PdfText {
    pub text: String,
    pub pages: u32,
    pub decision: PolicyDecision,
}

/// Groups fragments into lines by baseline; gaps wider than `column_gap` become a double space.
pub fn group_lines(fragments: &[TextFragment], tolerance: f32, column_gap: f32) -> Vec<String> {
    let mut lines: Vec<Vec<&TextFragment>> = Vec::new();
    let mut line_y: Option<f32> = None;

    for frag in fragments {
        let y = frag.y.round();
        match line_y {
            Some(ly) if (y - ly).abs() <= tolerance => {
                if let Some(cur) = lines.last_mut() {
                    cur.push(frag);
                }
            }
            _ => {
                lines.push(vec![frag]);
                line_y = Some(y);
            }
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x_min.total_cmp(&b.x_min));
            let mut out = String::new();
            let mut prev_end: Option<f32> = None;
            for frag in line {
                if let Some(end) = prev_end {
                    out.push_str(if frag.x_min - end > column_gap { "  " } else { " " });
                }
                out.push_str(&frag.text);
                prev_end = Some(frag.x_max);
            }
            out
        })
        .collect()
}

pub fn extract_text(
    cfg: &Config,
    engine: &dyn Engine,
    input: &Path,
    force_ocr: bool,
    lang: &str,
) -> Result<PdfText> {
    let pages = engine.page_count(input)?;
    if pages == 0 {
        warn!("pdf reports zero pages");
        return Ok(PdfText {
            text: String::new(),
            pages,
            decision: policy::decide(cfg, Some(""), force_ocr),
        });
    }
    if pages > cfg.limits.max_pdf_pages {
        bail!("input exceeds max_pdf_pages: {pages}");
    }

    let layer = if force_ocr || cfg.pdf.force_ocr {
        None
    } else {
        Some(extract_text_layer(cfg, engine, input, pages)?)
    };

    let decision = policy::decide(cfg, layer.as_deref(), force_ocr);
    info!(
        "pdf pages={} extraction={:?} reason={:?} text_chars={:?}",
        pages, decision.extraction, decision.reason, decision.text_chars
    );

    let text = match (decision.extraction, layer) {
        (ExtractionMode::TextLayer, Some(text)) => text,
        _ => {
            if decision.text_chars.is_some() {
                warn!("text layer too short; falling back to OCR ({lang})");
            }
            extract_ocr(engine, input, pages, lang)?
        }
    };

    Ok(PdfText {
        text: postprocess::clean_text(cfg, &text),
        pages,
        decision,
    })
}

fn extract_text_layer(cfg: &Config, engine: &dyn Engine, input: &Path, pages: u32) -> Result<String> {
    let mut out = Vec::with_capacity(pages as usize);
    for page in 1..=pages {
        let fragments = engine.text_fragments(input, page)?;
        debug!(page, fragments = fragments.len(), "text layer");
        out.push(group_lines(&fragments, cfg.pdf.line_tolerance, cfg.pdf.column_gap).join("\n"));
    }
    Ok(postprocess::merge_pages(out))
}

fn extract_ocr(engine: &dyn Engine, input: &Path, pages: u32, lang: &str) -> Result<String> {
    let mut out = Vec::with_capacity(pages as usize);
    for page in 1..=pages {
        let text = engine.ocr_page(input, page, lang)?;
        debug!(page, chars = text.len(), "ocr");
        out.push(text);
    }
    Ok(postprocess::merge_pages(out))
}

pub fn split_line(line: &str) -> Vec<String> {
    if line.contains(',') {
        line.split(',').map(|s| s.trim().to_string()).collect()
    } else {
        COLUMN_GAP.split(line).map(|s| s.trim().to_string()).collect()
    }
}

/// Everything up to and including the first line naming both patient code and
/// patient name is skipped (the first line when none does).
pub fn parse_rows(cfg: &Config, text: &str) -> Vec<CanonicalRow> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let header_idx = lines
        .iter()
        .position(|l| HEADER_CODE.is_match(l) && HEADER_NAME.is_match(l))
        .unwrap_or(0);

    let mut rows = Vec::new();
    for line in lines.iter().skip(header_idx + 1) {
        let cells = split_line(line);
        if cells.len() < cfg.pdf.min_cells {
            debug!("dropping short line ({} cells): {line}", cells.len());
            continue;
        }

        let mut row = schema::empty_row();
        let copied = cfg.pdf.copied_cells.min(schema::CANONICAL_WIDTH);
        for (slot, cell) in row.iter_mut().zip(cells).take(copied) {
            *slot = cell;
        }
        row[schema::AGE] = extract_age_number(&row[schema::AGE]);
        if row[schema::SECTION].is_empty() {
            row[schema::SECTION] = cfg.pdf.default_section.clone();
        }
        rows.push(row);
    }
    rows
}
