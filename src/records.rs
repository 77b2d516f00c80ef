use crate::{
    schema::{self, CanonicalRow, NEW_HEADERS},
    util::sha256_hex,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone)]
pub struct RecordDefaults {
    pub active_section: String,
    pub symptoms_notes: String,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            active_section: String::new(),
            symptoms_notes: "{}".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "Patient Code")]
    pub code: String,
    #[serde(rename = "Patient Name")]
    pub name: String,
    #[serde(rename = "Patient Age")]
    pub age: String,
    #[serde(rename = "Room")]
    pub room: String,
    #[serde(rename = "Diagnosis")]
    pub diagnosis: String,
    #[serde(rename = "Section")]
    pub section: String,
    #[serde(rename = "Admitting Provider")]
    pub admitting_provider: String,
    #[serde(rename = "Diet")]
    pub diet: String,
    #[serde(rename = "Isolation")]
    pub isolation: String,
    #[serde(rename = "Comments")]
    pub comments: String,
    #[serde(rename = "Symptoms")]
    pub symptoms: String,
    #[serde(rename = "Symptoms Notes")]
    pub symptoms_notes: String,
    #[serde(rename = "Labs Abnormal")]
    pub labs_abnormal: String,
}

impl PatientRecord {
    pub fn from_row(index: usize, row: &CanonicalRow, defaults: &RecordDefaults) -> Self {
        let or = |v: &str, d: &str| if v.is_empty() { d.to_string() } else { v.to_string() };
        let code = if row[schema::CODE].is_empty() {
            generated_code(index, row)
        } else {
            row[schema::CODE].clone()
        };

        Self {
            code,
            name: row[schema::NAME].clone(),
            age: row[schema::AGE].clone(),
            room: row[schema::ROOM].clone(),
            diagnosis: row[schema::DIAGNOSIS].clone(),
            section: or(&row[schema::SECTION], &defaults.active_section),
            admitting_provider: row[schema::PROVIDER].clone(),
            diet: row[schema::DIET].clone(),
            isolation: row[schema::ISOLATION].clone(),
            comments: row[schema::COMMENTS].clone(),
            symptoms: row[schema::SYMPTOMS].clone(),
            symptoms_notes: or(&row[schema::SYMPTOMS_NOTES], &defaults.symptoms_notes),
            labs_abnormal: row[schema::LABS_ABNORMAL].clone(),
        }
    }
}

pub fn to_records(rows: &[CanonicalRow], defaults: &RecordDefaults) -> Vec<PatientRecord> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| PatientRecord::from_row(i, r, defaults))
        .collect()
}

/// `P` followed by six upper-case hex digits derived from the row and its position.
fn generated_code(index: usize, row: &CanonicalRow) -> String {
    let digest = sha256_hex(format!("{index}\u{1f}{}", row.join("\u{1f}")).as_bytes());
    format!("P{}", digest[..6].to_uppercase())
}

pub fn write_canonical_csv<W: Write>(w: W, rows: &[CanonicalRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(NEW_HEADERS).with_context(|| "writing CSV header")?;
    for row in rows {
        wtr.write_record(row).with_context(|| "writing CSV row")?;
    }
    wtr.flush().with_context(|| "flushing CSV")?;
    Ok(())
}

pub fn write_template<W: Write>(w: W) -> Result<()> {
    write_canonical_csv(w, &[])
}
