//! Pipeline controller
//!
//! Drives one document through the chunk cycle:
//!
//! ```text
//! START -> CHUNK_UPDATE -> DETECT -> SUMMARIZE -> DETECT2 -> RESOLVE -> MERGE -> CHUNK_UPDATE ...
//!                 |           |
//!                 v           +--(no mentions)--> CHUNK_UPDATE
//!                END
//! ```
//!
//! Only stream exhaustion and an empty detection at `DETECT` fork the flow.
//! Chunks whose detection comes back empty never reach the rolling summary.
//! Everything durable goes to the store; the state here is dropped at `END`.

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::chunking::ChunkStream;
use crate::error::{AppError, Result};
use crate::models::{Mention, Profile, ProfileRecord};
use crate::observability::{RunStats, RunStatsSnapshot};
use crate::oracle::OracleAdapter;
use crate::services::resolver::EntityResolver;
use crate::storage::ProfileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStep {
    #[display("START")]
    Start,
    #[display("CHUNK_UPDATE")]
    ChunkUpdate,
    #[display("DETECT")]
    Detect,
    #[display("SUMMARIZE")]
    Summarize,
    #[display("DETECT2")]
    Detect2,
    #[display("RESOLVE")]
    Resolve,
    #[display("MERGE")]
    Merge,
    #[display("END")]
    End,
}

/// Working state of one run.
#[derive(Debug)]
pub struct PipelineState {
    chunks: ChunkStream,
    pub current_chunk: String,
    pub previous_chunk: String,
    pub last_mentions: Vec<Mention>,
    pub last_profiles: Vec<Profile>,
    pub last_summary: String,
    pub exhausted: bool,
    /// Chunks pulled so far.
    pub cycle: usize,
}

impl PipelineState {
    pub fn new(chunks: ChunkStream) -> Self {
        Self {
            chunks,
            current_chunk: String::new(),
            previous_chunk: String::new(),
            last_mentions: Vec::new(),
            last_profiles: Vec::new(),
            last_summary: String::new(),
            exhausted: false,
            cycle: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Every state entered, starting with `START` and ending with `END`.
    pub steps: Vec<PipelineStep>,
    pub stats: RunStatsSnapshot,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Store contents at `END`.
    pub profiles: Vec<ProfileRecord>,
}

/// The last third of `text` by characters: skips the first `2 * (n / 3)`.
pub fn trailing_third(text: &str) -> &str {
    let n = text.chars().count();
    let skip = 2 * (n / 3);
    match text.char_indices().nth(skip) {
        Some((i, _)) => &text[i..],
        None => "",
    }
}

/// Tail of `earlier` followed by `current`.
pub fn rolling_context(earlier: &str, current: &str) -> String {
    let tail = trailing_third(earlier);
    if tail.is_empty() {
        current.to_string()
    } else {
        format!("{} {}", tail, current)
    }
}

pub struct PipelineController {
    store: Arc<dyn ProfileStore>,
    resolver: Box<dyn EntityResolver>,
    oracle: OracleAdapter,
    stats: RunStats,
    state: PipelineState,
    step: PipelineStep,
}

impl PipelineController {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        resolver: Box<dyn EntityResolver>,
        oracle: OracleAdapter,
        stats: RunStats,
        chunks: ChunkStream,
    ) -> Self {
        Self {
            store,
            resolver,
            oracle,
            stats,
            state: PipelineState::new(chunks),
            step: PipelineStep::Start,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// The state the next call to [`step`](Self::step) will execute.
    pub fn current_step(&self) -> PipelineStep {
        self.step
    }

    /// Executes the current state and moves to the next one, which is returned.
    pub async fn step(&mut self) -> Result<PipelineStep> {
        let next = match self.step {
            PipelineStep::Start => self.start(),
            PipelineStep::ChunkUpdate => self.chunk_update(),
            PipelineStep::Detect => self.detect().await?,
            PipelineStep::Summarize => self.summarize().await?,
            PipelineStep::Detect2 => self.detect2().await?,
            PipelineStep::Resolve => self.resolve().await?,
            PipelineStep::Merge => self.merge().await?,
            PipelineStep::End => PipelineStep::End,
        };
        debug!(from = %self.step, to = %next, cycle = self.state.cycle, "transition");
        self.step = next;
        Ok(next)
    }

    /// Runs to `END`. Any error aborts the run; earlier commits stay in the store.
    pub async fn run(mut self) -> Result<RunReport> {
        let started_at = Utc::now();
        let started = Instant::now();
        let mut steps = vec![self.step];
        info!(oracle = self.oracle.backend_name(), "pipeline run started");

        while self.step != PipelineStep::End {
            match self.step().await {
                Ok(next) => steps.push(next),
                Err(e) => {
                    warn!(
                        step = %self.step,
                        cycle = self.state.cycle,
                        code = e.code(),
                        error = %e,
                        "pipeline run aborted"
                    );
                    return Err(e);
                }
            }
        }

        let profiles = self.store.list_all().await?;
        let report = RunReport {
            steps,
            stats: self.stats.snapshot(),
            started_at,
            elapsed_ms: started.elapsed().as_millis() as u64,
            profiles,
        };
        info!(
            chunks = report.stats.chunks_pulled,
            skipped = report.stats.chunks_skipped,
            merged = report.stats.cycles_merged,
            committed = report.stats.profiles_committed,
            stored = report.profiles.len(),
            elapsed_ms = report.elapsed_ms,
            "pipeline run finished"
        );
        Ok(report)
    }

    fn start(&mut self) -> PipelineStep {
        if self.state.chunks.is_empty() {
            self.state.exhausted = true;
            PipelineStep::End
        } else {
            PipelineStep::ChunkUpdate
        }
    }

    fn chunk_update(&mut self) -> PipelineStep {
        match self.state.chunks.next() {
            Some(chunk) => {
                self.state.previous_chunk = std::mem::replace(&mut self.state.current_chunk, chunk.text);
                self.state.cycle += 1;
                self.stats.record_chunk();
                debug!(index = chunk.index, start = chunk.start, end = chunk.end, "chunk pulled");
                PipelineStep::Detect
            }
            None => {
                self.state.exhausted = true;
                PipelineStep::End
            }
        }
    }

    async fn detect(&mut self) -> Result<PipelineStep> {
        let context = rolling_context(&self.state.previous_chunk, &self.state.current_chunk);
        self.state.last_mentions = self.oracle.detect(&context).await?;

        if self.state.last_mentions.is_empty() {
            self.stats.record_skip();
            debug!(cycle = self.state.cycle, "no mentions, chunk skipped");
            Ok(PipelineStep::ChunkUpdate)
        } else {
            Ok(PipelineStep::Summarize)
        }
    }

    async fn summarize(&mut self) -> Result<PipelineStep> {
        let context = rolling_context(&self.state.last_summary, &self.state.current_chunk);
        let mut names: Vec<String> = Vec::new();
        for mention in &self.state.last_mentions {
            if !names.contains(&mention.name) {
                names.push(mention.name.clone());
            }
        }

        self.state.last_summary = self.oracle.summarize(&context, &names).await?;
        Ok(PipelineStep::Detect2)
    }

    async fn detect2(&mut self) -> Result<PipelineStep> {
        self.state.last_mentions = self.oracle.detect(&self.state.last_summary).await?;
        Ok(PipelineStep::Resolve)
    }

    async fn resolve(&mut self) -> Result<PipelineStep> {
        self.state.last_profiles = self.resolver.resolve_all(&self.state.last_mentions).await?;
        Ok(PipelineStep::Merge)
    }

    async fn merge(&mut self) -> Result<PipelineStep> {
        if self.state.last_profiles.is_empty() {
            debug!(cycle = self.state.cycle, "empty working set, nothing to merge");
            return Ok(PipelineStep::ChunkUpdate);
        }

        let merged = self
            .oracle
            .merge(&self.state.last_summary, &self.state.last_profiles)
            .await?;

        let mut committed = Vec::with_capacity(merged.len());
        for mut profile in merged {
            let stored_name = self
                .state
                .last_profiles
                .iter()
                .find(|p| p.id == profile.id)
                .map(|p| p.name.clone())
                .ok_or_else(|| AppError::Internal(format!("profile {} left the working set", profile.id)))?;
            profile.fold_name_into_aliases(&stored_name);

            if !self.store.update(&profile.id, &profile.document()).await? {
                return Err(AppError::Database(format!(
                    "commit failed: profile {} not found",
                    profile.id
                )));
            }
            committed.push(profile);
        }

        self.stats.record_merge();
        self.stats.record_committed(committed.len() as u64);
        info!(cycle = self.state.cycle, committed = committed.len(), "profiles merged");
        self.state.last_profiles = committed;
        Ok(PipelineStep::ChunkUpdate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_third() {
        assert_eq!(trailing_third(""), "");
        assert_eq!(trailing_third("ab"), "ab");
        assert_eq!(trailing_third("abcdef"), "ef");
        assert_eq!(trailing_third("abcdefg"), "efg");
        assert_eq!(trailing_third("أبجدهوز"), "هوز");
    }

    #[test]
    fn test_rolling_context() {
        assert_eq!(rolling_context("", "current"), "current");
        assert_eq!(rolling_context("abcdef", "current"), "ef current");
    }

    #[test]
    fn test_step_names() {
        assert_eq!(PipelineStep::ChunkUpdate.to_string(), "CHUNK_UPDATE");
        assert_eq!(PipelineStep::Detect2.to_string(), "DETECT2");
        assert_eq!(
            serde_json::to_value(PipelineStep::ChunkUpdate).unwrap(),
            serde_json::json!("CHUNK_UPDATE")
        );
        assert_eq!(
            serde_json::to_value(PipelineStep::Detect2).unwrap(),
            serde_json::json!("DETECT2")
        );
    }
}
