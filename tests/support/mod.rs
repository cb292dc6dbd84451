// Shared fixtures for the integration tests.
//
// ScriptedOracle answers detect/summarize calls from queues and merge calls
// through a handler, recording every request so tests can inspect the
// contexts the pipeline built.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dramatis::chunking::Chunker;
use dramatis::error::Result;
use dramatis::observability::RunStats;
use dramatis::oracle::schema::{
    CharacterPayload, DetectResponse, MergeResponse, ProfilePayload, SummaryResponse,
};
use dramatis::oracle::{OracleAdapter, OracleBackend};
use dramatis::retry::RetryPolicy;
use dramatis::services::{PipelineController, create_entity_resolver};
use dramatis::storage::ProfileStore;

pub type MergeHandler = Box<dyn Fn(&str, &[ProfilePayload]) -> Result<MergeResponse> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Detect(String),
    Summarize(String, Vec<String>),
    Merge(String, Vec<String>),
}

/// Oracle whose answers are fixed up front.
///
/// Detect and summarize pop from their queues; an exhausted detect queue
/// answers with no characters and an exhausted summarize queue echoes the
/// context. Merge defaults to appending the summary as an event.
pub struct ScriptedOracle {
    detections: Mutex<VecDeque<Result<DetectResponse>>>,
    summaries: Mutex<VecDeque<Result<SummaryResponse>>>,
    merge: MergeHandler,
    calls: Mutex<Vec<Call>>,
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            detections: Mutex::new(VecDeque::new()),
            summaries: Mutex::new(VecDeque::new()),
            merge: Box::new(|summary, profiles| {
                Ok(MergeResponse {
                    profiles: profiles
                        .iter()
                        .cloned()
                        .map(|mut p| {
                            p.events.push(summary.to_string());
                            p
                        })
                        .collect(),
                })
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn detect(self, characters: &[(&str, &str)]) -> Self {
        self.detections.lock().push_back(Ok(detection(characters)));
        self
    }

    pub fn detect_err(self, err: dramatis::error::AppError) -> Self {
        self.detections.lock().push_back(Err(err));
        self
    }

    pub fn summary(self, summary: &str) -> Self {
        self.summaries.lock().push_back(Ok(SummaryResponse {
            summary: summary.to_string(),
        }));
        self
    }

    pub fn on_merge(
        mut self,
        handler: impl Fn(&str, &[ProfilePayload]) -> Result<MergeResponse> + Send + Sync + 'static,
    ) -> Self {
        self.merge = Box::new(handler);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn detect_contexts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Detect(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn merge_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Merge(..)))
            .count()
    }
}

pub fn detection(characters: &[(&str, &str)]) -> DetectResponse {
    DetectResponse {
        characters: characters
            .iter()
            .map(|(name, hint)| CharacterPayload {
                name: name.to_string(),
                hint: hint.to_string(),
            })
            .collect(),
    }
}

#[async_trait]
impl OracleBackend for ScriptedOracle {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn detect(&self, text: &str) -> Result<DetectResponse> {
        self.calls.lock().push(Call::Detect(text.to_string()));
        self.detections
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(DetectResponse::default()))
    }

    async fn summarize(&self, text: &str, names: &[String]) -> Result<SummaryResponse> {
        self.calls
            .lock()
            .push(Call::Summarize(text.to_string(), names.to_vec()));
        self.summaries.lock().pop_front().unwrap_or_else(|| {
            Ok(SummaryResponse {
                summary: text.to_string(),
            })
        })
    }

    async fn merge(&self, text: &str, profiles: &[ProfilePayload]) -> Result<MergeResponse> {
        self.calls.lock().push(Call::Merge(
            text.to_string(),
            profiles.iter().map(|p| p.id.clone()).collect(),
        ));
        (self.merge)(text, profiles)
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(4))
}

/// Controller over `text` with the given chunk size and no overlap.
pub fn controller(
    store: Arc<dyn ProfileStore>,
    oracle: Arc<dyn OracleBackend>,
    text: &str,
    chunk_size: usize,
) -> PipelineController {
    let stats = RunStats::default();
    let chunks = Chunker::new(chunk_size, 0)
        .expect("valid chunker")
        .chunk(text.to_string());
    PipelineController::new(
        store.clone(),
        create_entity_resolver(store, stats.clone()),
        OracleAdapter::new(oracle, fast_retry(), stats.clone()),
        stats,
        chunks,
    )
}
