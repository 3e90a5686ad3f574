//! geo-eval core library
//!
//! Client-side orchestration of a two-phase GEO analysis session:
//! - `stream`: turns the service's chunked line stream into typed events
//! - `session`: the session state machine and the driver that runs phases
//! - `aggregate`: merges near-duplicate company citations into a ranking
//! - `client`: HTTP transport to the analysis service

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod stream;

pub use aggregate::{CompanyAggregator, CompanyRecord, ContainmentMatcher, NameMatcher};
pub use client::{AnalysisService, HttpAnalysisService, KeywordsRequest, Language, RankingsRequest};
pub use config::ClientConfig;
pub use error::{ErrorKind, GeoError, Result};
pub use session::{
    AnalysisSession, DefaultStageLabels, PhaseOutcome, Reducer, SessionDriver, SessionInputs,
    SessionView, Stage, StageLabels,
};
pub use stream::{decode_events, LineDecoder, RawCitationRecord, StreamEvent};
