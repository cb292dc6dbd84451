//! Separator levels and the recursive splitter that turns text into fitting pieces.

/// One rung of the separator ladder, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorLevel {
    Paragraph,
    Line,
    Sentence,
    Clause,
    Whitespace,
    Character,
}

impl SeparatorLevel {
    pub const LADDER: [SeparatorLevel; 6] = [
        SeparatorLevel::Paragraph,
        SeparatorLevel::Line,
        SeparatorLevel::Sentence,
        SeparatorLevel::Clause,
        SeparatorLevel::Whitespace,
        SeparatorLevel::Character,
    ];

    fn patterns(self) -> &'static [&'static str] {
        match self {
            SeparatorLevel::Paragraph => &["\n\n"],
            SeparatorLevel::Line => &["\n"],
            SeparatorLevel::Sentence => &[". ", "؟ ", "? ", "! "],
            SeparatorLevel::Clause => &["، ", "؛ ", ", ", "; "],
            SeparatorLevel::Whitespace | SeparatorLevel::Character => &[],
        }
    }

    /// Splits `text` keeping every separator attached to the piece before it,
    /// so the pieces concatenate back to `text`.
    fn split(self, text: &str) -> Vec<&str> {
        match self {
            SeparatorLevel::Whitespace => text.split_inclusive(char::is_whitespace).collect(),
            SeparatorLevel::Character => text
                .char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect(),
            _ => split_after_any(text, self.patterns()),
        }
    }
}

fn split_after_any<'a>(text: &'a str, patterns: &[&str]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        match patterns.iter().find(|p| rest.starts_with(*p)) {
            Some(p) => {
                i += p.len();
                parts.push(&text[start..i]);
                start = i;
            }
            None => {
                i += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

/// A contiguous slice of the source, identified by byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub start: usize,
    pub end: usize,
    pub chars: usize,
}

/// Tiles `text` with pieces of at most `size` characters, using the coarsest
/// separator that yields a fitting piece and falling through to finer ones
/// only for the parts that still do not fit.
pub fn split_pieces(text: &str, size: usize) -> Vec<Piece> {
    let mut pieces = Vec::new();
    collect(text, 0, 0, size, &mut pieces);
    pieces
}

fn collect(text: &str, offset: usize, level: usize, size: usize, out: &mut Vec<Piece>) {
    if text.is_empty() {
        return;
    }

    let chars = text.chars().count();
    if chars <= size {
        out.push(Piece {
            start: offset,
            end: offset + text.len(),
            chars,
        });
        return;
    }

    match SeparatorLevel::LADDER.get(level) {
        Some(SeparatorLevel::Character) | None => {
            // runs of `size` characters
            let mut run_start = 0;
            let mut run_chars = 0;
            for (i, _) in text.char_indices() {
                if run_chars == size {
                    out.push(Piece {
                        start: offset + run_start,
                        end: offset + i,
                        chars: run_chars,
                    });
                    run_start = i;
                    run_chars = 0;
                }
                run_chars += 1;
            }
            out.push(Piece {
                start: offset + run_start,
                end: offset + text.len(),
                chars: run_chars,
            });
        }
        Some(sep) => {
            let mut part_offset = offset;
            for part in sep.split(text) {
                collect(part, part_offset, level + 1, size, out);
                part_offset += part.len();
            }
        }
    }
}
