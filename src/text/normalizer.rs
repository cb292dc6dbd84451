//! Text normalization applied once before chunking.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:https?://|www\.)\S+").unwrap());
static HORIZONTAL_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// Removes URLs, diacritics and tatweel, unifies alif forms, and tidies
/// whitespace while keeping paragraph and line breaks for the chunker.
#[derive(Debug, Default, Clone)]
pub struct ArabicNormalizer;

impl ArabicNormalizer {
    fn map_char(c: char) -> Option<char> {
        match c {
            '\u{064B}'..='\u{0652}' | '\u{0640}' => None,
            '\u{0622}' | '\u{0623}' | '\u{0625}' => Some('\u{0627}'),
            '\u{0649}' => Some('\u{064A}'),
            other => Some(other),
        }
    }
}

impl TextNormalizer for ArabicNormalizer {
    fn normalize(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let text = URL_RE.replace_all(&text, "");
        let text: String = text.chars().filter_map(Self::map_char).collect();
        let text = HORIZONTAL_WS_RE.replace_all(&text, " ");

        let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
        let joined = lines.join("\n");
        BLANK_LINES_RE
            .replace_all(&joined, "\n\n")
            .trim()
            .to_string()
    }
}
