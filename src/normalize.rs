use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static AGE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)([0-9]{1,3})(?-u:\b)").expect("static age regex")
});
static AGE_ANY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{1,3}").expect("static age regex"));
static UNNAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^unnamed(?:[\s:_.\-]*[0-9]*)?$").expect("static unnamed regex")
});
static UNNAMED_STRICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^unnamed:").expect("static unnamed regex"));

pub fn norm(s: &str) -> String {
    s.replace('\u{00A0}', " ").trim().to_string()
}

pub fn eq_case(a: &str, b: &str) -> bool {
    norm(a).to_lowercase() == norm(b).to_lowercase()
}

pub fn eq_relaxed(a: &str, b: &str) -> bool {
    relaxed_key(a) == relaxed_key(b)
}

fn relaxed_key(s: &str) -> String {
    let s: String = s.nfkc().collect();
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn normalize_row_length<S: AsRef<str>>(row: &[S], n: usize) -> Vec<String> {
    let mut out = vec![String::new(); n];
    for (slot, cell) in out.iter_mut().zip(row) {
        *slot = cell.as_ref().to_string();
    }
    out
}

/// First 1-3 digit number in `v`: `"72 Years 4 Months"` gives `"72"`.
pub fn extract_age_number(v: &str) -> String {
    let s = v.trim();
    if let Some(m) = AGE_TOKEN.captures(s).and_then(|c| c.get(1)) {
        return m.as_str().to_string();
    }
    AGE_ANY
        .find(s)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

pub fn is_unnamed(header: &str) -> bool {
    UNNAMED.is_match(header.trim())
}

pub fn is_unnamed_strict(header: &str) -> bool {
    UNNAMED_STRICT.is_match(header.trim())
}

pub fn is_blank_row<S: AsRef<str>>(row: &[S]) -> bool {
    row.iter().all(|c| norm(c.as_ref()).is_empty())
}
