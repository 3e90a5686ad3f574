//! Transport to the analysis service
//!
//! Each phase is one POST whose response body streams line records. The
//! [`AnalysisService`] trait is the seam the session driver talks to.

mod http;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use http::{HealthStatus, HttpAnalysisService};

/// Response body as a stream of raw chunks
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Target market of the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "pt_BR")]
    PtBr,
    #[default]
    #[serde(rename = "en_US")]
    EnUs,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::PtBr => write!(f, "pt_BR"),
            Language::EnUs => write!(f, "en_US"),
        }
    }
}

/// Phase 1 request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordsRequest {
    pub brand_name: String,
    pub city: String,
    pub language: Language,
}

/// Phase 2 request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingsRequest {
    pub session_id: String,
    pub keywords: Vec<String>,
}

/// The two streaming exchanges of an analysis session
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Open the keyword-extraction stream
    async fn extract_keywords(&self, request: &KeywordsRequest) -> Result<ByteStream>;

    /// Open the citation-ranking stream
    async fn rank_citations(&self, request: &RankingsRequest) -> Result<ByteStream>;
}
