//! Strips title pages, publisher notes and similar front matter from the start of a book.

const SEARCH_WINDOW_CHARS: usize = 2000;
const MAX_METADATA_LINE_CHARS: usize = 80;

/// Words that mark where the narrative itself begins (chapter, first, part).
const CONTENT_MARKERS: [&str; 3] = ["فصل", "أول", "جزء"];

const METADATA_KEYWORDS: [&str; 29] = [
    "نشر", "ترجمة", "شركة", "صحافة", "طباعة", "توزيع", "موافقة", "ناشر", "غلاف", "تأليف",
    "مركز", "دار", "حقوق", "محفوظة", "كاتب", "أديب", "مؤلف", "رقم", "تاريخ", "رواية", "كتاب",
    "نسخة", "قانون", "مترجم", "طبعة", "تحرير", "محرر", "إهداء", "فاكس",
];

/// Returns the text with its front matter removed, or unchanged when none is found.
///
/// Inside the first 2000 characters the earliest content marker wins. Without
/// one, the last metadata keyword sitting on a short line ends the front matter
/// and the text resumes right after the word containing it.
pub fn strip_front_matter(text: &str) -> &str {
    let window_end = text
        .char_indices()
        .nth(SEARCH_WINDOW_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let window = &text[..window_end];

    if let Some(start) = CONTENT_MARKERS.iter().filter_map(|m| window.find(m)).min() {
        return &text[start..];
    }

    let mut last_metadata: Option<usize> = None;
    let mut line_start = 0;
    for line in window.split('\n') {
        if line.trim().chars().count() <= MAX_METADATA_LINE_CHARS {
            for keyword in METADATA_KEYWORDS {
                if let Some(pos) = line.find(keyword) {
                    let absolute = line_start + pos;
                    if last_metadata.is_none_or(|last| absolute > last) {
                        last_metadata = Some(absolute);
                    }
                }
            }
        }
        line_start += line.len() + 1;
    }

    match last_metadata {
        Some(pos) => {
            let rest = &window[pos..];
            let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            &text[pos + word_end..]
        }
        None => text,
    }
}
