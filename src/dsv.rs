use serde::{Deserialize, Serialize};

pub type RawTable = Vec<Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Tab,
    Semicolon,
}

impl Delimiter {
    pub const CANDIDATES: [Delimiter; 3] = [Delimiter::Comma, Delimiter::Tab, Delimiter::Semicolon];

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
        }
    }
}

pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{FEFF}').unwrap_or(s)
}

/// Picks the delimiter occurring most often in the first line of `text`.
/// Ties go to the earlier candidate; a line with none of them yields comma.
pub fn detect_delimiter(text: &str) -> Delimiter {
    let first = text.split('\n').next().unwrap_or("");
    let first = first.strip_suffix('\r').unwrap_or(first);

    let mut best = Delimiter::Comma;
    let mut max = 0usize;
    for d in Delimiter::CANDIDATES {
        let n = first.chars().filter(|&c| c == d.as_char()).count();
        if n > max {
            max = n;
            best = d;
        }
    }
    best
}

/// Outside quotes `\n`, `\r\n` and `\r` end a row. The final row is only kept
/// when it holds more than one field or a non-empty single field.
pub fn tokenize(text: &str, delim: Delimiter) -> RawTable {
    let d = delim.as_char();
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            '\n' | '\r' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            c if c == d => row.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    row.push(field);
    if row.len() > 1 || !row[0].is_empty() {
        rows.push(row);
    }
    rows
}
