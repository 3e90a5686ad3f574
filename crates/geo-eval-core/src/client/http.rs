//! reqwest-backed analysis service client

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{AnalysisService, ByteStream, KeywordsRequest, RankingsRequest};
use crate::config::ClientConfig;
use crate::error::{GeoError, Result};

/// Service health as reported by `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// HTTP client for the streaming analysis endpoints
pub struct HttpAnalysisService {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpAnalysisService {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Check the service is up
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.config.health_url();
        debug!("Health check: {}", url);
        let response = self.client.get(&url).send().await?;
        let response = handle_error_response(response).await?;
        Ok(response.json().await?)
    }

    async fn open_stream<T: Serialize + Sync>(&self, url: &str, body: &T) -> Result<ByteStream> {
        info!("Opening analysis stream: {}", url);
        let response = self.client.post(url).json(body).send().await?;
        let response = handle_error_response(response).await?;
        Ok(Box::pin(response.bytes_stream().map_err(GeoError::from)))
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn extract_keywords(&self, request: &KeywordsRequest) -> Result<ByteStream> {
        self.open_stream(&self.config.keywords_url(), request).await
    }

    async fn rank_citations(&self, request: &RankingsRequest) -> Result<ByteStream> {
        self.open_stream(&self.config.rankings_url(), request).await
    }
}

/// Turn a non-2xx response into a transport error, preferring the body's `detail`
async fn handle_error_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
    warn!("Analysis service returned {}: {}", status, message);

    Err(GeoError::Transport {
        status: Some(status.as_u16()),
        message,
    })
}

/// FastAPI-style error bodies carry `detail` as a string or a list of issues
fn error_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
