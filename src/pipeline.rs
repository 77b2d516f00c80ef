use crate::{
    config::Config,
    dsv::{self, Delimiter, RawTable},
    engine::Engine,
    error::ImportError,
    normalize::is_blank_row,
    pdf,
    probe::{self, InputKind, ProbeInput},
    schema::CanonicalRow,
    session::{ImportMode, ImportSession, PdfSummary, SessionSlot},
    template::{TemplateRegistry, Validated},
    util::sha256_hex,
};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub force_ocr: bool,
    pub ocr_lang: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReadTable {
    pub delimiter: Delimiter,
    pub header: Vec<String>,
    pub data: RawTable,
    pub lossy: bool,
}

pub struct Pipeline<E: Engine> {
    cfg: Config,
    engine: E,
    registry: TemplateRegistry,
}

impl<E: Engine> Pipeline<E> {
    pub fn new(cfg: &Config, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            engine,
            registry: TemplateRegistry::new(cfg.import.template_order.clone()),
        }
    }

    pub fn import_file(&self, input: &Path, opts: &ImportOptions) -> Result<ImportSession, ImportError> {
        let (probe, bytes) = probe::probe_input(&self.cfg, input)?;
        self.import_probed(input, &probe, &bytes, opts)
    }

    pub fn import_probed(
        &self,
        input: &Path,
        probe: &ProbeInput,
        bytes: &[u8],
        opts: &ImportOptions,
    ) -> Result<ImportSession, ImportError> {
        info!(
            "input kind={:?} bytes={} sha256={}",
            probe.kind, probe.file_bytes, probe.sha256
        );
        match probe.kind {
            InputKind::Delimited => self.import_text(bytes),
            InputKind::Pdf => self.import_pdf(input, &probe.sha256, opts),
        }
    }

    /// Runs a parse through `slot`; only the most recently started parse may land there.
    pub fn import_into(
        &self,
        slot: &SessionSlot,
        input: &Path,
        opts: &ImportOptions,
    ) -> Result<(), ImportError> {
        let ticket = slot.begin();
        slot.complete(ticket, self.import_file(input, opts))
    }

    pub fn import_text(&self, bytes: &[u8]) -> Result<ImportSession, ImportError> {
        let table = read_table(bytes)?;
        let validated = self.registry.validate(&table.header)?;
        let rows = normalize_rows(&validated, &table.header, &table.data);

        info!(
            "template={} delimiter={:?} rows={}",
            validated.matcher.name(),
            table.delimiter,
            rows.len()
        );

        let mut session = ImportSession::new(
            ImportMode::Template {
                matcher: validated.matcher,
            },
            format!("{} {} rows ready.", validated.message, rows.len()),
            table.header,
            rows,
            sha256_hex(bytes),
        );
        if table.lossy {
            session
                .warnings
                .push("file is not valid UTF-8; undecodable bytes were replaced".to_string());
        }
        Ok(session)
    }

    /// PDF path. Any extraction failure discards the whole parse.
    pub fn import_pdf(
        &self,
        input: &Path,
        sha256: &str,
        opts: &ImportOptions,
    ) -> Result<ImportSession, ImportError> {
        let lang = self.resolve_lang(opts.ocr_lang.as_deref());
        let extracted = pdf::extract_text(&self.cfg, &self.engine, input, opts.force_ocr, &lang)
            .map_err(|e| ImportError::PdfFailed(format!("{e:#}")))?;

        let rows = pdf::parse_rows(&self.cfg, &extracted.text);
        if rows.is_empty() {
            return Err(ImportError::NoTableDetected);
        }

        let extraction = extracted.decision.extraction;
        let mut session = ImportSession::new(
            ImportMode::Pdf {
                extraction,
                lang: lang.clone(),
            },
            format!("{} rows ready.", rows.len()),
            Vec::new(),
            rows,
            sha256.to_string(),
        );
        if session.used_ocr() {
            session
                .warnings
                .push(format!("OCR ({lang}) used. Verify columns before import."));
        }
        session.pdf = Some(PdfSummary {
            pages: extracted.pages,
            decision: extracted.decision,
        });
        Ok(session)
    }

    fn resolve_lang(&self, requested: Option<&str>) -> String {
        let ocr = &self.cfg.ocr;
        match requested {
            Some(l) if ocr.allowed_langs.iter().any(|a| a == l) => l.to_string(),
            Some(l) => {
                warn!("OCR language {l} not allowed; using {}", ocr.lang);
                ocr.lang.clone()
            }
            None => ocr.lang.clone(),
        }
    }
}

pub fn read_table(bytes: &[u8]) -> Result<ReadTable, ImportError> {
    let decoded = String::from_utf8_lossy(bytes);
    let lossy = matches!(decoded, std::borrow::Cow::Owned(_));
    if lossy {
        warn!("input is not valid UTF-8; replacing undecodable bytes");
    }

    let text = dsv::strip_bom(&decoded);
    let delimiter = dsv::detect_delimiter(text);
    let mut rows = dsv::tokenize(text, delimiter).into_iter();
    let Some(mut header) = rows.next() else {
        return Err(ImportError::EmptyFile);
    };
    if let Some(first) = header.first_mut() {
        *first = dsv::strip_bom(first).to_string();
    }

    Ok(ReadTable {
        delimiter,
        header,
        data: rows.collect(),
        lossy,
    })
}

pub fn normalize_rows(validated: &Validated, header: &[String], data: &[Vec<String>]) -> Vec<CanonicalRow> {
    data.iter()
        .filter(|r| !is_blank_row(r.as_slice()))
        .map(|r| validated.matcher.map_row(r, header))
        .collect()
}
