pub const CANONICAL_WIDTH: usize = 13;

pub const NEW_HEADERS: [&str; CANONICAL_WIDTH] = [
    "Patient Code",
    "Patient Name",
    "Patient Age",
    "Room",
    "Diagnosis",
    "Section",
    "Admitting Provider",
    "Diet",
    "Isolation",
    "Comments",
    "Symptoms (comma-separated)",
    "Symptoms Notes (JSON map)",
    "Labs Abnormal (comma-separated)",
];

pub const LEGACY_HEADERS: [&str; 9] = [
    "Patient Code",
    "Patient Name",
    "Patient Age",
    "Room",
    "Admitting Provider",
    "Cause Of Admission",
    "Diet",
    "Isolation",
    "Comments",
];

/// Column names a custom spreadsheet export must carry (lower-case, any order).
pub const CUSTOM_REQUIRED: [&str; 9] = [
    "patient code",
    "patient name",
    "patient age",
    "room",
    "admitting provider",
    "cause of admission",
    "diet",
    "isolation",
    "comments",
];

pub const CODE: usize = 0;
pub const NAME: usize = 1;
pub const AGE: usize = 2;
pub const ROOM: usize = 3;
pub const DIAGNOSIS: usize = 4;
pub const SECTION: usize = 5;
pub const PROVIDER: usize = 6;
pub const DIET: usize = 7;
pub const ISOLATION: usize = 8;
pub const COMMENTS: usize = 9;
pub const SYMPTOMS: usize = 10;
pub const SYMPTOMS_NOTES: usize = 11;
pub const LABS_ABNORMAL: usize = 12;

pub type CanonicalRow = [String; CANONICAL_WIDTH];

pub fn empty_row() -> CanonicalRow {
    std::array::from_fn(|_| String::new())
}
