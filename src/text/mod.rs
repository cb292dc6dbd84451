//! Preprocessing boundary: language gate, front-matter stripping and normalization.
//!
//! Runs once per document before any chunk is produced.

pub mod front_matter;
pub mod language;
pub mod normalizer;

pub use front_matter::strip_front_matter;
pub use language::{GateVerdict, LanguageGate, ScriptVoteGate};
pub use normalizer::{ArabicNormalizer, TextNormalizer};

use crate::config::PreprocessConfig;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum PreparedText {
    Accepted(String),
    Rejected(GateVerdict),
}

pub struct Preprocessor {
    gate: Option<Box<dyn LanguageGate>>,
    normalizer: Option<Box<dyn TextNormalizer>>,
    strip_front_matter: bool,
}

impl Preprocessor {
    pub fn new(
        gate: Option<Box<dyn LanguageGate>>,
        normalizer: Option<Box<dyn TextNormalizer>>,
        strip_front_matter: bool,
    ) -> Self {
        Self {
            gate,
            normalizer,
            strip_front_matter,
        }
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        let gate = config
            .language_gate
            .then(|| Box::new(ScriptVoteGate::new(config.gate_threshold)) as Box<dyn LanguageGate>);
        let normalizer = config
            .normalize
            .then(|| Box::new(ArabicNormalizer) as Box<dyn TextNormalizer>);
        Self::new(gate, normalizer, config.strip_front_matter)
    }

    /// A preprocessor that passes text through untouched.
    pub fn passthrough() -> Self {
        Self::new(None, None, false)
    }

    /// Gate, then strip front matter, then normalize.
    pub fn prepare(&self, raw: &str) -> PreparedText {
        // an empty document is not a language problem, it just yields no chunks
        if raw.trim().is_empty() {
            return PreparedText::Accepted(String::new());
        }

        if let Some(gate) = &self.gate {
            let verdict = gate.check(raw);
            debug!(?verdict, "language gate");
            if !verdict.accepted {
                info!(
                    ratio = verdict.arabic_ratio,
                    votes = verdict.votes,
                    "document rejected by language gate"
                );
                return PreparedText::Rejected(verdict);
            }
        }

        let body = if self.strip_front_matter {
            strip_front_matter(raw)
        } else {
            raw
        };

        let text = match &self.normalizer {
            Some(normalizer) => normalizer.normalize(body),
            None => body.to_string(),
        };

        debug!(
            raw_chars = raw.chars().count(),
            prepared_chars = text.chars().count(),
            "document prepared"
        );
        PreparedText::Accepted(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_pipeline_on_arabic_book() {
        let raw = "دار النشر\r\nالفصل الأول\r\n\r\n\r\nكَانَ   الجو باردا في تلك الليلة، وجلس العجوز أمام المدفأة يحكي لأحفاده.";
        let pre = Preprocessor::from_config(&PreprocessConfig::default());
        match pre.prepare(raw) {
            PreparedText::Accepted(text) => {
                assert!(text.starts_with("فصل الاول"));
                assert!(text.contains("\n\nكان الجو"));
            }
            PreparedText::Rejected(v) => panic!("unexpected rejection: {:?}", v),
        }
    }

    #[test]
    fn test_gate_rejects_non_arabic() {
        let pre = Preprocessor::from_config(&PreprocessConfig::default());
        let prepared = pre.prepare("This is an English novel about a quiet village by the sea.");
        assert!(matches!(prepared, PreparedText::Rejected(_)));
    }

    #[test]
    fn test_empty_document_is_accepted_empty() {
        let pre = Preprocessor::from_config(&PreprocessConfig::default());
        assert_eq!(pre.prepare("  \n "), PreparedText::Accepted(String::new()));
    }

    #[test]
    fn test_passthrough() {
        let raw = "  Samir  met Layla. ";
        assert_eq!(
            Preprocessor::passthrough().prepare(raw),
            PreparedText::Accepted(raw.to_string())
        );
    }
}
