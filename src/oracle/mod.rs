//! Oracle adapter
//!
//! Typed marshaling and retry around the external reasoning service that
//! detects characters, writes the rolling summary and merges profiles. No
//! domain decisions are taken here beyond checking that responses are
//! well-formed.

pub mod http;
pub mod schema;
pub mod simple;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use validator::Validate;

use crate::config::OracleConfig;
use crate::error::{AppError, Result};
use crate::models::{Mention, Profile, normalize_mentions};
use crate::observability::RunStats;
use crate::retry::RetryPolicy;
use schema::{DetectResponse, MergeResponse, ProfilePayload, SummaryResponse};

pub use http::HttpOracleBackend;
pub use simple::SimpleOracleBackend;

/// Transport to a reasoning service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OracleBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn detect(&self, text: &str) -> Result<DetectResponse>;

    async fn summarize(&self, text: &str, names: &[String]) -> Result<SummaryResponse>;

    async fn merge(&self, text: &str, profiles: &[ProfilePayload]) -> Result<MergeResponse>;
}

pub fn create_oracle_backend(config: &OracleConfig) -> Result<Arc<dyn OracleBackend>> {
    match config.backend.as_str() {
        "http" => Ok(Arc::new(HttpOracleBackend::new(config)?)),
        "simple" => Ok(Arc::new(SimpleOracleBackend::new())),
        other => Err(AppError::Config(format!("未知的 Oracle 后端: {}", other))),
    }
}

pub fn retry_policy(config: &OracleConfig) -> RetryPolicy {
    RetryPolicy::new(
        config.max_retries,
        Duration::from_millis(config.retry_base_delay_ms),
        Duration::from_millis(config.retry_max_delay_ms),
    )
}

pub struct OracleAdapter {
    backend: Arc<dyn OracleBackend>,
    retry: RetryPolicy,
    stats: RunStats,
}

impl OracleAdapter {
    pub fn new(backend: Arc<dyn OracleBackend>, retry: RetryPolicy, stats: RunStats) -> Self {
        Self {
            backend,
            retry: retry.with_stats(stats.clone()),
            stats,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Character mentions found in `context`, cleaned and deduplicated.
    pub async fn detect(&self, context: &str) -> Result<Vec<Mention>> {
        let response = self
            .retry
            .run("oracle.detect", || async move {
                self.stats.record_oracle_call();
                self.backend.detect(context).await
            })
            .await?;

        let mentions = normalize_mentions(response.characters.into_iter().map(Mention::from).collect());
        debug!(count = mentions.len(), "mentions detected");
        Ok(mentions)
    }

    /// New rolling summary. An empty summary counts as a malformed response.
    pub async fn summarize(&self, context: &str, names: &[String]) -> Result<String> {
        let response = self
            .retry
            .run("oracle.summarize", || async move {
                self.stats.record_oracle_call();
                let response = self.backend.summarize(context, names).await?;
                let response = SummaryResponse {
                    summary: response.summary.trim().to_string(),
                };
                response
                    .validate()
                    .map_err(|e| AppError::MalformedResponse(format!("empty summary: {}", e)))?;
                Ok(response)
            })
            .await?;
        Ok(response.summary)
    }

    /// Refined profiles for the given working set.
    ///
    /// Every returned id must be non-empty, unique and one of the ids that
    /// were sent; otherwise the whole batch is rejected. Fewer profiles than
    /// requested is accepted.
    pub async fn merge(&self, summary: &str, profiles: &[Profile]) -> Result<Vec<Profile>> {
        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let payloads: Vec<ProfilePayload> = profiles.iter().map(ProfilePayload::from).collect();
        let payloads = payloads.as_slice();
        let response = self
            .retry
            .run("oracle.merge", || async move {
                self.stats.record_oracle_call();
                self.backend.merge(summary, payloads).await
            })
            .await?;

        response.validate()?;

        let requested: HashSet<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        let mut seen = HashSet::new();
        for payload in &response.profiles {
            if !requested.contains(payload.id.as_str()) {
                return Err(AppError::Validation(format!(
                    "merge returned unknown id {}",
                    payload.id
                )));
            }
            if !seen.insert(payload.id.as_str()) {
                return Err(AppError::Validation(format!(
                    "merge returned id {} more than once",
                    payload.id
                )));
            }
        }

        if response.profiles.len() < profiles.len() {
            warn!(
                requested = profiles.len(),
                returned = response.profiles.len(),
                "merge returned fewer profiles than requested"
            );
        }

        Ok(response.profiles.into_iter().map(Profile::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::schema::CharacterPayload;
    use mockall::Sequence;

    fn build(mock: MockOracleBackend) -> (OracleAdapter, RunStats) {
        let stats = RunStats::default();
        let retry = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2));
        (OracleAdapter::new(Arc::new(mock), retry, stats.clone()), stats)
    }

    fn profile(id: &str, name: &str) -> Profile {
        Profile::skeleton(id, name, "")
    }

    fn payload(id: &str) -> ProfilePayload {
        ProfilePayload {
            id: id.into(),
            name: "X".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_detect_cleans_mentions() {
        let mut mock = MockOracleBackend::new();
        mock.expect_detect().returning(|_| {
            Ok(DetectResponse {
                characters: vec![
                    CharacterPayload { name: " X ".into(), hint: "the old neighbor".into() },
                    CharacterPayload { name: "".into(), hint: "ghost".into() },
                    CharacterPayload { name: "X".into(), hint: "the old neighbor".into() },
                ],
            })
        });

        let (adapter, stats) = build(mock);
        let mentions = adapter.detect("text").await.unwrap();
        assert_eq!(mentions, vec![Mention::new("X", "the old neighbor")]);
        assert_eq!(stats.snapshot().oracle_calls, 1);
    }

    #[tokio::test]
    async fn test_empty_summary_is_retried_then_fails() {
        let mut mock = MockOracleBackend::new();
        mock.expect_summarize()
            .times(3)
            .returning(|_, _| Ok(SummaryResponse { summary: "  ".into() }));

        let (adapter, stats) = build(mock);
        let err = adapter.summarize("ctx", &["X".into()]).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
        assert_eq!(stats.snapshot().retries, 2);
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let mut mock = MockOracleBackend::new();
        let mut seq = Sequence::new();
        mock.expect_summarize()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(AppError::RateLimited));
        mock.expect_summarize()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SummaryResponse { summary: "X arrived.".into() }));

        let (adapter, _) = build(mock);
        assert_eq!(adapter.summarize("ctx", &[]).await.unwrap(), "X arrived.");
    }

    #[tokio::test]
    async fn test_merge_skips_call_for_empty_working_set() {
        let mut mock = MockOracleBackend::new();
        mock.expect_merge().never();
        let (adapter, _) = build(mock);
        assert!(adapter.merge("s", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_rejects_foreign_id() {
        let mut mock = MockOracleBackend::new();
        mock.expect_merge().returning(|_, _| {
            Ok(MergeResponse {
                profiles: vec![payload("c-1"), payload("intruder")],
            })
        });

        let (adapter, _) = build(mock);
        let err = adapter.merge("s", &[profile("c-1", "X")]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("intruder")));
    }

    #[tokio::test]
    async fn test_merge_rejects_duplicate_and_empty_ids() {
        let mut mock = MockOracleBackend::new();
        mock.expect_merge().times(1).returning(|_, _| {
            Ok(MergeResponse {
                profiles: vec![payload("c-1"), payload("c-1")],
            })
        });
        let (adapter, _) = build(mock);
        assert!(matches!(
            adapter.merge("s", &[profile("c-1", "X")]).await,
            Err(AppError::Validation(_))
        ));

        let mut mock = MockOracleBackend::new();
        mock.expect_merge().times(1).returning(|_, _| {
            Ok(MergeResponse {
                profiles: vec![payload("")],
            })
        });
        let (adapter, _) = build(mock);
        assert!(matches!(
            adapter.merge("s", &[profile("c-1", "X")]).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_merge_accepts_subset() {
        let mut mock = MockOracleBackend::new();
        mock.expect_merge().times(1).returning(|text, profiles| {
            assert_eq!(text, "summary");
            assert_eq!(profiles.len(), 2);
            Ok(MergeResponse { profiles: vec![payload("c-2")] })
        });

        let (adapter, _) = build(mock);
        let merged = adapter
            .merge("summary", &[profile("c-1", "X"), profile("c-2", "X")])
            .await
            .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "c-2");
    }

    #[tokio::test]
    async fn test_fatal_oracle_error_is_not_retried() {
        let mut mock = MockOracleBackend::new();
        mock.expect_detect()
            .times(1)
            .returning(|_| Err(AppError::Oracle("400 bad request".into())));
        let (adapter, stats) = build(mock);
        assert!(matches!(adapter.detect("t").await, Err(AppError::Oracle(_))));
        assert_eq!(stats.snapshot().retries, 0);
    }
}
