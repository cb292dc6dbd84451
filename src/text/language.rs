//! Language gate: decides whether a document is Arabic prose worth processing.

use serde::Serialize;
use whatlang::{Lang, Script};

const ARABIC_RANGES: [(u32, u32); 5] = [
    (0x0600, 0x06FF),
    (0x0750, 0x077F),
    (0x08A0, 0x08FF),
    (0xFB50, 0xFDFF),
    (0xFE70, 0xFEFF),
];

/// Outcome of a gate check, kept for logging and for the rejected run outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateVerdict {
    pub accepted: bool,
    /// Share of alphabetic characters inside the Arabic blocks (0.0-1.0).
    pub arabic_ratio: f64,
    pub detected_lang: Option<String>,
    pub script_confidence: f64,
    pub votes: u8,
}

pub trait LanguageGate: Send + Sync {
    fn check(&self, text: &str) -> GateVerdict;
}

/// Majority vote of three independent signals: the Arabic letter ratio,
/// the detected language and the detected script with its confidence.
#[derive(Debug, Clone)]
pub struct ScriptVoteGate {
    threshold: f64,
}

impl ScriptVoteGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    fn arabic_ratio(text: &str) -> Option<f64> {
        let (mut arabic, mut letters) = (0usize, 0usize);
        for c in text.chars().filter(|c| c.is_alphabetic()) {
            letters += 1;
            let code = c as u32;
            if ARABIC_RANGES
                .iter()
                .any(|&(start, end)| (start..=end).contains(&code))
            {
                arabic += 1;
            }
        }
        (letters > 0).then(|| arabic as f64 / letters as f64)
    }
}

impl Default for ScriptVoteGate {
    fn default() -> Self {
        Self::new(0.95)
    }
}

impl LanguageGate for ScriptVoteGate {
    fn check(&self, text: &str) -> GateVerdict {
        let Some(ratio) = Self::arabic_ratio(text) else {
            return GateVerdict {
                accepted: false,
                arabic_ratio: 0.0,
                detected_lang: None,
                script_confidence: 0.0,
                votes: 0,
            };
        };

        let info = whatlang::detect(text);
        let detected_lang = info.as_ref().map(|i| i.lang().code().to_string());
        let script_confidence = info.as_ref().map(|i| i.confidence()).unwrap_or(0.0);

        let votes = [
            ratio >= self.threshold,
            info.as_ref().is_some_and(|i| i.lang() == Lang::Ara),
            info.as_ref()
                .is_some_and(|i| i.script() == Script::Arabic && i.confidence() >= self.threshold),
        ]
        .into_iter()
        .filter(|v| *v)
        .count() as u8;

        GateVerdict {
            accepted: votes >= 2,
            arabic_ratio: ratio,
            detected_lang,
            script_confidence,
            votes,
        }
    }
}
