use crate::{config::Config, error::ImportError, util::sha256_hex};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Delimited,
    Pdf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeInput {
    pub path: String,
    pub file_bytes: u64,
    pub kind: InputKind,
    pub sha256: String,
}

pub fn probe_input(cfg: &Config, input: &Path) -> Result<(ProbeInput, Vec<u8>), ImportError> {
    let meta = std::fs::metadata(input)
        .map_err(|e| ImportError::Parse(format!("stat {}: {e}", input.display())))?;
    let file_bytes = meta.len();
    if file_bytes > cfg.limits.max_input_file_bytes {
        return Err(ImportError::InputTooLarge {
            bytes: file_bytes,
            limit: cfg.limits.max_input_file_bytes,
        });
    }

    let bytes = std::fs::read(input)
        .map_err(|e| ImportError::Parse(format!("read {}: {e}", input.display())))?;

    let probe = ProbeInput {
        path: input.display().to_string(),
        file_bytes,
        kind: classify(input, &bytes),
        sha256: sha256_hex(&bytes),
    };
    Ok((probe, bytes))
}

pub fn classify(input: &Path, bytes: &[u8]) -> InputKind {
    let by_ext = input
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if bytes.starts_with(b"%PDF-") || by_ext {
        InputKind::Pdf
    } else {
        InputKind::Delimited
    }
}
