use crate::{
    config::Config,
    engine::{poppler::PopplerEngine, Engine},
    error::ImportError,
    pipeline::{read_table, ImportOptions, Pipeline},
    probe::{self, InputKind},
    records::{self, RecordDefaults},
    report::ImportReport,
    template::{TemplateRegistry, ValidationResult},
    util::{ensure_dir, now_rfc3339, sha256_hex},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "rounds-import")]
#[command(about = "Normalize patient-rounds spreadsheets and PDFs into canonical rows")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./rounds-import.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the PDF and OCR tools.
    Doctor {},
    /// Show the detected delimiter, header and template match.
    Inspect {
        #[arg(long)]
        input: PathBuf,
    },
    /// Parse a file and print the preview table.
    Preview {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        ocr: OcrArgs,
    },
    /// Parse a file and write canonical rows, records and a report.
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Active section for rows that arrive without one.
        #[arg(long)]
        section: Option<String>,
        #[command(flatten)]
        ocr: OcrArgs,
    },
    /// Write the blank NEW-template CSV.
    Template {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct OcrArgs {
    /// OCR every PDF page even when a text layer exists.
    #[arg(long)]
    pub force_ocr: bool,
    /// OCR language (e.g. eng, ara).
    #[arg(long)]
    pub ocr_lang: Option<String>,
}

impl From<&OcrArgs> for ImportOptions {
    fn from(a: &OcrArgs) -> Self {
        Self {
            force_ocr: a.force_ocr,
            ocr_lang: a.ocr_lang.clone(),
        }
    }
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Inspect { input } => inspect(&cfg, input),
        Command::Preview { input, ocr } => preview(&cfg, input, &ocr.into()),
        Command::Run {
            input,
            out_dir,
            section,
            ocr,
        } => run(&cfg, input, out_dir.as_deref(), section.as_deref(), &ocr.into()),
        Command::Template { out } => template(&cfg, out.as_deref()),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["rounds-import.toml", "rounds-import.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.out_dir).join("rounds-import.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let engine = PopplerEngine::new(cfg);
    let diag = engine.doctor()?;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn inspect(cfg: &Config, input: &Path) -> Result<()> {
    let (probe, bytes) = probe::probe_input(cfg, input).map_err(user_error)?;

    let detail = match probe.kind {
        InputKind::Pdf => serde_json::json!({ "note": "PDF input; headers are located after text extraction" }),
        InputKind::Delimited => {
            let table = read_table(&bytes).map_err(user_error)?;
            let registry = TemplateRegistry::new(cfg.import.template_order.clone());
            let validation = ValidationResult::from(&registry.validate(&table.header));
            serde_json::json!({
                "delimiter": table.delimiter,
                "header": table.header,
                "data_rows": table.data.len(),
                "validation": validation,
            })
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "input": probe,
            "detail": detail,
        }))?
    );
    Ok(())
}

fn preview(cfg: &Config, input: &Path, opts: &ImportOptions) -> Result<()> {
    let pipeline = Pipeline::new(cfg, PopplerEngine::new(cfg));
    let session = pipeline.import_file(input, opts).map_err(user_error)?;
    let preview = session.preview(cfg.import.preview_rows);

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "message": session.message,
            "preview": preview,
            "note": preview.note(),
            "warnings": session.warnings,
        }))?
    );
    Ok(())
}

fn run(
    cfg: &Config,
    input: &Path,
    out_override: Option<&Path>,
    section: Option<&str>,
    opts: &ImportOptions,
) -> Result<()> {
    let started = now_rfc3339();
    let (probe, bytes) = probe::probe_input(cfg, input).map_err(user_error)?;

    let cfg_hash = sha256_hex(cfg.normalized_for_hash().as_bytes());
    let job_id = sha256_hex(format!("{}:{}", cfg_hash, probe.sha256).as_bytes());
    let out_root = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
    let final_dir = out_root.join(&job_id).join("final");
    ensure_dir(&final_dir)?;
    info!("job_id={job_id} out={}", final_dir.display());

    let pipeline = Pipeline::new(cfg, PopplerEngine::new(cfg));
    let session = pipeline
        .import_probed(input, &probe, &bytes, opts)
        .map_err(user_error)?;
    let rows = session.consume_validated_rows();

    if cfg.output.write_csv {
        let path = final_dir.join(&cfg.output.csv_filename);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("create {}", path.display()))?;
        records::write_canonical_csv(file, &rows)?;
    }

    if cfg.output.write_records_json {
        let defaults = RecordDefaults {
            active_section: section
                .map(str::to_string)
                .unwrap_or_else(|| cfg.import.default_section.clone()),
            symptoms_notes: cfg.import.default_symptoms_notes.clone(),
        };
        let recs = records::to_records(&rows, &defaults);
        std::fs::write(
            final_dir.join(&cfg.output.records_filename),
            serde_json::to_string_pretty(&recs)?,
        )?;
    }

    if cfg.output.write_report_json {
        let report = ImportReport::new(probe, &session, started, now_rfc3339());
        std::fs::write(
            final_dir.join(&cfg.output.report_filename),
            serde_json::to_string_pretty(&report)?,
        )?;
    }

    if cfg.output.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "job_id": job_id,
                "out": final_dir,
                "mode": session.mode.label(),
                "rows": rows.len(),
                "message": session.message,
                "warnings": session.warnings,
            }))?
        );
    }

    Ok(())
}

fn template(cfg: &Config, out: Option<&Path>) -> Result<()> {
    let path = out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.output.template_filename));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("create {}", path.display()))?;
    records::write_template(file)?;
    info!("template written to {}", path.display());
    Ok(())
}

fn user_error(err: ImportError) -> anyhow::Error {
    let msg = err.user_message();
    if msg == err.to_string() {
        anyhow::Error::new(err)
    } else {
        anyhow::Error::new(err).context(msg)
    }
}
