use crate::config::Config;
use unicode_normalization::UnicodeNormalization;

pub fn merge_pages(pages: Vec<String>) -> String {
    pages.join("\n")
}

pub fn clean_text(cfg: &Config, text: &str) -> String {
    let mut s = text.to_string();

    if cfg.postprocess.normalize_newlines {
        s = s.replace("\r\n", "\n").replace('\r', "\n");
    }

    if cfg.postprocess.normalize_unicode {
        s = s.nfkc().collect::<String>();
    }

    s = s.replace('\u{00A0}', " ");

    sanitize_control_chars(&s, &cfg.postprocess.control_chars_to_sanitize)
}

fn sanitize_control_chars(s: &str, codes: &[u8]) -> String {
    if codes.is_empty() {
        return s.to_string();
    }

    let mut mask = [false; 128];
    for &code in codes {
        if (code as usize) < mask.len() {
            mask[code as usize] = true;
        }
    }

    s.chars()
        .filter(|&ch| {
            // Line and column structure must survive.
            if ch == '\n' || ch == '\r' || ch == '\t' {
                return true;
            }
            let cp = ch as u32;
            if cp < 128 {
                !mask[cp as usize]
            } else {
                !ch.is_control()
            }
        })
        .collect()
}
