//! HTTP transport to a remote reasoning service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

use super::OracleBackend;
use super::schema::{
    DetectRequest, DetectResponse, MergeRequest, MergeResponse, OracleRequest, ProfilePayload,
    SummarizeRequest, SummaryResponse,
};
use crate::config::OracleConfig;
use crate::error::{AppError, Result};

/// Posts each call as JSON to `{base_url}/detect`, `/summarize` or `/merge`.
#[derive(Debug, Clone)]
pub struct HttpOracleBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    detect_temperature: f32,
    summary_temperature: f32,
    merge_temperature: f32,
}

impl HttpOracleBackend {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| AppError::Config(format!("HTTP 客户端初始化失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            detect_temperature: config.detect_temperature,
            summary_temperature: config.summary_temperature,
            merge_temperature: config.merge_temperature,
        })
    }

    async fn call<P, R>(&self, endpoint: &str, temperature: f32, payload: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        let body = OracleRequest {
            model: &self.model,
            temperature,
            payload,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%url, %status, bytes = text.len(), "oracle response");

        if !status.is_success() {
            return Err(Self::status_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            error!(%url, error = %e, "failed to parse oracle response");
            AppError::MalformedResponse(format!("{}: {}", endpoint, e))
        })
    }

    fn status_error(status: StatusCode, body: &str) -> AppError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                AppError::Timeout(format!("HTTP {}", status))
            }
            s if s.is_server_error() => AppError::Connection(format!("HTTP {}: {}", s, body)),
            s => {
                error!(status = %s, body, "oracle rejected request");
                AppError::Oracle(format!("HTTP {}: {}", s, body))
            }
        }
    }
}

#[async_trait]
impl OracleBackend for HttpOracleBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn detect(&self, text: &str) -> Result<DetectResponse> {
        self.call("detect", self.detect_temperature, DetectRequest { text })
            .await
    }

    async fn summarize(&self, text: &str, names: &[String]) -> Result<SummaryResponse> {
        self.call(
            "summarize",
            self.summary_temperature,
            SummarizeRequest { text, names },
        )
        .await
    }

    async fn merge(&self, text: &str, profiles: &[ProfilePayload]) -> Result<MergeResponse> {
        self.call("merge", self.merge_temperature, MergeRequest { text, profiles })
            .await
    }
}
