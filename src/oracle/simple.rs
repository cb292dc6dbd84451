//! Offline heuristic backend.
//!
//! Deterministic stand-in for the reasoning service: capitalised runs are
//! taken as names, an appositive right after a name ("X, the old neighbor,")
//! becomes its hint, summaries are the sentences that mention a detected
//! name, and merging appends those sentences as events and records
//! co-occurring characters as relationships. Good enough to exercise the
//! whole pipeline without network access; not a substitute for real reasoning.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::OracleBackend;
use super::schema::{CharacterPayload, DetectResponse, MergeResponse, ProfilePayload, SummaryResponse};
use crate::error::Result;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*").unwrap());
static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?؟\n]+[.!?؟]?").unwrap());

const STOPWORDS: [&str; 24] = [
    "The", "A", "An", "He", "She", "It", "They", "We", "I", "You", "His", "Her", "Their", "But",
    "And", "Then", "When", "There", "This", "That", "In", "On", "At", "After",
];

/// Upper bound on the summary length, in characters.
const MAX_SUMMARY_CHARS: usize = 2_000;

#[derive(Debug, Default, Clone)]
pub struct SimpleOracleBackend;

impl SimpleOracleBackend {
    pub fn new() -> Self {
        Self
    }

    fn sentences(text: &str) -> impl Iterator<Item = &str> {
        SENTENCE_RE
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
    }

    fn names(text: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for m in NAME_RE.find_iter(text) {
            let words: Vec<&str> = m
                .as_str()
                .split_whitespace()
                .skip_while(|w| STOPWORDS.contains(w))
                .collect();
            let name = words.join(" ");
            if name.chars().count() > 1 && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn hint_for(text: &str, name: &str) -> String {
        let pattern = format!(r"{},\s+([^,.;!?]+)[,.;!?]", regex::escape(name));
        Regex::new(&pattern)
            .ok()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|hint| hint.starts_with(|c: char| c.is_lowercase()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl OracleBackend for SimpleOracleBackend {
    fn name(&self) -> &'static str {
        "simple"
    }

    async fn detect(&self, text: &str) -> Result<DetectResponse> {
        let characters = Self::names(text)
            .into_iter()
            .map(|name| CharacterPayload {
                hint: Self::hint_for(text, &name),
                name,
            })
            .collect();
        Ok(DetectResponse { characters })
    }

    async fn summarize(&self, text: &str, names: &[String]) -> Result<SummaryResponse> {
        let mut summary = String::new();
        for sentence in Self::sentences(text).filter(|s| names.iter().any(|n| s.contains(n.as_str()))) {
            if summary.chars().count() + sentence.chars().count() > MAX_SUMMARY_CHARS {
                break;
            }
            if !summary.is_empty() {
                summary.push(' ');
            }
            summary.push_str(sentence);
        }

        if summary.is_empty() {
            summary = Self::sentences(text)
                .next()
                .map(|s| s.chars().take(MAX_SUMMARY_CHARS).collect())
                .unwrap_or_default();
        }

        Ok(SummaryResponse { summary })
    }

    async fn merge(&self, text: &str, profiles: &[ProfilePayload]) -> Result<MergeResponse> {
        let sentences: Vec<&str> = Self::sentences(text).collect();

        let merged = profiles
            .iter()
            .map(|profile| {
                let mut profile = profile.clone();
                let mut known: HashSet<String> = profile.events.iter().cloned().collect();

                for sentence in sentences.iter().filter(|s| s.contains(profile.name.as_str())) {
                    if known.insert(sentence.to_string()) {
                        profile.events.push(sentence.to_string());
                    }

                    for other in profiles.iter().filter(|o| o.name != profile.name) {
                        let relation = format!("{}: appears with", other.name);
                        if sentence.contains(other.name.as_str()) && !profile.relationships.contains(&relation) {
                            profile.relationships.push(relation);
                        }
                    }
                }
                profile
            })
            .collect();

        Ok(MergeResponse { profiles: merged })
    }
}
