//! Analysis session state
//!
//! One session per user interaction, owned by a single caller and replaced
//! wholesale on reset. Stream records advance it through [`Reducer`](super::Reducer);
//! the caller edits keywords and starts phases through the methods here.

use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::CompanyRecord;
use crate::client::{KeywordsRequest, Language, RankingsRequest};
use crate::config::DEFAULT_MAX_KEYWORDS;
use crate::error::{ErrorKind, GeoError, Result};

/// Where the session is in its two-phase lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Collecting brand, city and language
    #[default]
    Input,
    /// Phase 1 requested, no session id yet
    Initializing,
    KeywordsInProgress,
    /// Proposed keywords available for editing
    KeywordsReady,
    RankingInProgress,
    ResultsReady,
    /// Last phase failed; earlier data is kept
    Error,
}

impl Stage {
    /// A phase is running and its stream is being read
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            Stage::Initializing | Stage::KeywordsInProgress | Stage::RankingInProgress
        )
    }
}

/// The two request/stream exchanges of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Keywords,
    Ranking,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Keywords => write!(f, "keyword extraction"),
            Phase::Ranking => write!(f, "citation ranking"),
        }
    }
}

/// User-supplied inputs for phase 1
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionInputs {
    pub brand_name: String,
    /// Optional; empty means no location filter
    pub city: String,
    pub language: Language,
}

impl SessionInputs {
    pub fn new(brand_name: impl Into<String>, city: impl Into<String>, language: Language) -> Self {
        Self {
            brand_name: brand_name.into(),
            city: city.into(),
            language,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisSession {
    pub(super) session_id: Option<String>,
    pub(super) stage: Stage,
    pub(super) phase: Option<Phase>,
    pub(super) inputs: SessionInputs,
    pub(super) proposed_keywords: Vec<String>,
    pub(super) edited_keywords: Vec<String>,
    pub(super) progress_label: Option<String>,
    pub(super) results: Vec<CompanyRecord>,
    pub(super) last_error: Option<GeoError>,
    max_keywords: usize,
}

impl AnalysisSession {
    pub fn new(max_keywords: usize) -> Self {
        Self {
            session_id: None,
            stage: Stage::Input,
            phase: None,
            inputs: SessionInputs::default(),
            proposed_keywords: Vec::new(),
            edited_keywords: Vec::new(),
            progress_label: None,
            results: Vec::new(),
            last_error: None,
            max_keywords,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Phase whose stream is currently being applied
    pub fn active_phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn inputs(&self) -> &SessionInputs {
        &self.inputs
    }

    pub fn proposed_keywords(&self) -> &[String] {
        &self.proposed_keywords
    }

    pub fn edited_keywords(&self) -> &[String] {
        &self.edited_keywords
    }

    pub fn progress_label(&self) -> Option<&str> {
        self.progress_label.as_deref()
    }

    pub fn results(&self) -> &[CompanyRecord] {
        &self.results
    }

    pub fn last_error(&self) -> Option<&GeoError> {
        self.last_error.as_ref()
    }

    pub fn max_keywords(&self) -> usize {
        self.max_keywords
    }

    /// Start (or restart) keyword extraction
    ///
    /// Keywords and results from earlier phases stay until the new phase
    /// completes and overwrites them.
    pub fn begin_keywords(&mut self, inputs: SessionInputs) -> Result<KeywordsRequest> {
        if inputs.brand_name.trim().is_empty() {
            let err = GeoError::Validation("Company name is required".to_string());
            self.fail(&err);
            return Err(err);
        }

        let inputs = SessionInputs {
            brand_name: inputs.brand_name.trim().to_string(),
            city: inputs.city.trim().to_string(),
            language: inputs.language,
        };
        info!(
            "Starting {} for '{}' ({}, {})",
            Phase::Keywords,
            inputs.brand_name,
            inputs.city,
            inputs.language
        );

        self.inputs = inputs;
        self.stage = Stage::Initializing;
        self.phase = Some(Phase::Keywords);
        self.progress_label = None;
        self.last_error = None;

        Ok(KeywordsRequest {
            brand_name: self.inputs.brand_name.clone(),
            city: self.inputs.city.clone(),
            language: self.inputs.language,
        })
    }

    /// Start (or restart) citation ranking with the edited keywords
    pub fn begin_rankings(&mut self) -> Result<RankingsRequest> {
        let request = match self.rankings_request() {
            Ok(request) => request,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };
        info!(
            "Starting {} for session {} with {} keywords",
            Phase::Ranking,
            request.session_id,
            request.keywords.len()
        );

        self.stage = Stage::RankingInProgress;
        self.phase = Some(Phase::Ranking);
        self.progress_label = None;
        self.last_error = None;
        Ok(request)
    }

    fn rankings_request(&self) -> Result<RankingsRequest> {
        let session_id = self.session_id.clone().ok_or_else(|| {
            GeoError::Validation("No analysis session; extract keywords first".to_string())
        })?;
        if self.edited_keywords.is_empty() {
            return Err(GeoError::Validation(
                "At least one keyword is required".to_string(),
            ));
        }
        if self.edited_keywords.len() > self.max_keywords {
            return Err(GeoError::Validation(format!(
                "You can only search for up to {} keywords.",
                self.max_keywords
            )));
        }
        Ok(RankingsRequest {
            session_id,
            keywords: self.edited_keywords.clone(),
        })
    }

    /// Append a keyword to the edited list
    ///
    /// A rejected edit returns a validation error and leaves the session as it was.
    pub fn add_keyword(&mut self, text: &str) -> Result<()> {
        self.ensure_editable()?;
        let keyword = text.trim();
        if keyword.is_empty() {
            return Err(GeoError::Validation("Keyword cannot be blank".to_string()));
        }
        if self.edited_keywords.len() >= self.max_keywords {
            return Err(GeoError::Validation(format!(
                "You can only search for up to {} keywords.",
                self.max_keywords
            )));
        }
        self.edited_keywords.push(keyword.to_string());
        self.mark_edited();
        Ok(())
    }

    /// Remove the keyword at `index`, keeping the others in order
    pub fn remove_keyword(&mut self, index: usize) -> Result<String> {
        self.ensure_editable()?;
        if index >= self.edited_keywords.len() {
            return Err(GeoError::Validation(format!(
                "No keyword at position {} (have {})",
                index,
                self.edited_keywords.len()
            )));
        }
        let removed = self.edited_keywords.remove(index);
        self.mark_edited();
        Ok(removed)
    }

    /// `Error` stays until a new phase starts, so its message stays accurate
    fn mark_edited(&mut self) {
        if self.stage != Stage::Error {
            self.stage = Stage::KeywordsReady;
        }
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.stage.is_in_flight() {
            return Err(GeoError::Validation(
                "Keywords cannot be edited while a phase is running".to_string(),
            ));
        }
        Ok(())
    }

    /// Abandon the phase in flight and return to where the user can edit again
    pub(super) fn cancel(&mut self) {
        let Some(phase) = self.phase.take() else {
            return;
        };
        self.stage = match phase {
            Phase::Keywords if self.proposed_keywords.is_empty() => Stage::Input,
            Phase::Keywords | Phase::Ranking => Stage::KeywordsReady,
        };
        self.progress_label = None;
        info!("{} cancelled, back to {:?}", phase, self.stage);
    }

    /// Move to `Error`, keeping keywords and results
    pub fn fail(&mut self, err: &GeoError) {
        warn!("Session failed in {:?}: {}", self.stage, err);
        self.stage = Stage::Error;
        self.phase = None;
        self.progress_label = None;
        self.last_error = Some(err.clone());
    }

    /// Snapshot for the presentation layer
    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.session_id.clone(),
            stage: self.stage,
            progress_label: self.progress_label.clone(),
            proposed_keywords: self.proposed_keywords.clone(),
            edited_keywords: self.edited_keywords.clone(),
            results: self.results.clone(),
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
            error_kind: self.last_error.as_ref().map(GeoError::kind),
        }
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEYWORDS)
    }
}

/// Everything the presentation layer renders, re-derived after every event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: Option<String>,
    pub stage: Stage,
    pub progress_label: Option<String>,
    pub proposed_keywords: Vec<String>,
    pub edited_keywords: Vec<String>,
    pub results: Vec<CompanyRecord>,
    pub last_error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_session(keywords: &[&str]) -> AnalysisSession {
        let mut session = AnalysisSession::default();
        session.session_id = Some("s-1".to_string());
        session.stage = Stage::KeywordsReady;
        session.proposed_keywords = keywords.iter().map(|k| k.to_string()).collect();
        session.edited_keywords = session.proposed_keywords.clone();
        session
    }

    #[test]
    fn test_begin_keywords_requires_brand() {
        let mut session = AnalysisSession::default();
        let err = session
            .begin_keywords(SessionInputs::new("   ", "joinville", Language::PtBr))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.stage(), Stage::Error);
        assert_eq!(session.view().last_error.as_deref(), Some("Company name is required"));
    }

    #[test]
    fn test_begin_keywords_trims_inputs_and_clears_error() {
        let mut session = AnalysisSession::default();
        session.fail(&GeoError::Protocol("earlier".into()));
        let request = session
            .begin_keywords(SessionInputs::new(" copapel ", " joinville ", Language::PtBr))
            .unwrap();
        assert_eq!(request.brand_name, "copapel");
        assert_eq!(request.city, "joinville");
        assert_eq!(session.stage(), Stage::Initializing);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_add_keyword_appends_trimmed() {
        let mut session = ready_session(&["a"]);
        session.add_keyword("  papel toalha ").unwrap();
        assert_eq!(session.edited_keywords(), ["a", "papel toalha"]);
    }

    #[test]
    fn test_add_blank_keyword_is_noop() {
        let mut session = ready_session(&["a"]);
        assert!(session.add_keyword("   ").is_err());
        assert_eq!(session.edited_keywords(), ["a"]);
        assert_eq!(session.stage(), Stage::KeywordsReady);
    }

    #[test]
    fn test_add_keyword_noop_at_max() {
        let full: Vec<String> = (0..10).map(|i| format!("k{i}")).collect();
        let refs: Vec<&str> = full.iter().map(String::as_str).collect();
        let mut session = ready_session(&refs);

        let err = session.add_keyword("eleventh").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.edited_keywords().len(), 10);
        assert_eq!(session.stage(), Stage::KeywordsReady);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_remove_keyword_every_index() {
        let keywords = ["a", "b", "c", "d"];
        for i in 0..keywords.len() {
            let mut session = ready_session(&keywords);
            assert_eq!(session.remove_keyword(i).unwrap(), keywords[i]);
            let expected: Vec<&str> = keywords
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, k)| *k)
                .collect();
            assert_eq!(session.edited_keywords(), expected.as_slice());
        }
    }

    #[test]
    fn test_remove_keyword_out_of_range_is_noop() {
        let mut session = ready_session(&["a", "b"]);
        assert!(session.remove_keyword(2).is_err());
        assert_eq!(session.edited_keywords(), ["a", "b"]);
    }

    #[test]
    fn test_edits_rejected_while_in_flight() {
        let mut session = ready_session(&["a"]);
        session.begin_rankings().unwrap();
        assert!(session.add_keyword("b").is_err());
        assert!(session.remove_keyword(0).is_err());
        assert_eq!(session.edited_keywords(), ["a"]);
    }

    #[test]
    fn test_editing_after_results_reenters_keywords_ready() {
        let mut session = ready_session(&["a"]);
        session.stage = Stage::ResultsReady;
        session.add_keyword("b").unwrap();
        assert_eq!(session.stage(), Stage::KeywordsReady);
        assert_eq!(session.edited_keywords(), ["a", "b"]);
    }

    #[test]
    fn test_editing_after_error_keeps_error() {
        let mut session = ready_session(&["a"]);
        session.fail(&GeoError::Protocol("Failed to refine analysis: boom".into()));

        session.add_keyword("b").unwrap();
        assert_eq!(session.stage(), Stage::Error);
        assert_eq!(
            session.view().last_error.as_deref(),
            Some("Failed to refine analysis: boom")
        );

        session.remove_keyword(0).unwrap();
        assert_eq!(session.stage(), Stage::Error);
        assert_eq!(session.edited_keywords(), ["b"]);

        // A new phase is what clears it
        session.begin_rankings().unwrap();
        assert_eq!(session.stage(), Stage::RankingInProgress);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_cancel_ranking_returns_to_keywords_ready() {
        let mut session = ready_session(&["a"]);
        session.begin_rankings().unwrap();
        session.progress_label = Some("Gathering results".to_string());

        session.cancel();
        assert_eq!(session.stage(), Stage::KeywordsReady);
        assert_eq!(session.active_phase(), None);
        assert!(session.progress_label().is_none());
        session.add_keyword("b").unwrap();
        assert_eq!(session.edited_keywords(), ["a", "b"]);
    }

    #[test]
    fn test_cancel_first_extraction_returns_to_input() {
        let mut session = AnalysisSession::default();
        session
            .begin_keywords(SessionInputs::new("copapel", "", Language::PtBr))
            .unwrap();
        session.cancel();
        assert_eq!(session.stage(), Stage::Input);
        assert_eq!(session.active_phase(), None);
    }

    #[test]
    fn test_cancel_reextraction_keeps_keywords_ready() {
        let mut session = ready_session(&["a"]);
        session
            .begin_keywords(SessionInputs::new("copapel", "", Language::PtBr))
            .unwrap();
        session.cancel();
        assert_eq!(session.stage(), Stage::KeywordsReady);
        assert_eq!(session.edited_keywords(), ["a"]);
    }

    #[test]
    fn test_begin_rankings_requires_session_id() {
        let mut session = AnalysisSession::default();
        session.add_keyword("a").unwrap();
        let err = session.begin_rankings().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.stage(), Stage::Error);
        assert_eq!(session.edited_keywords(), ["a"]);
    }

    #[test]
    fn test_begin_rankings_requires_keywords() {
        let mut session = ready_session(&[]);
        assert!(session.begin_rankings().is_err());
    }

    #[test]
    fn test_begin_rankings_builds_request() {
        let mut session = ready_session(&["a", "b"]);
        let request = session.begin_rankings().unwrap();
        assert_eq!(request.session_id, "s-1");
        assert_eq!(request.keywords, vec!["a", "b"]);
        assert_eq!(session.stage(), Stage::RankingInProgress);
        assert_eq!(session.active_phase(), Some(Phase::Ranking));
    }

    #[test]
    fn test_fail_keeps_data() {
        let mut session = ready_session(&["a"]);
        session.fail(&GeoError::transport("down"));
        assert_eq!(session.stage(), Stage::Error);
        assert_eq!(session.edited_keywords(), ["a"]);
        assert_eq!(session.view().error_kind, Some(ErrorKind::Transport));
    }
}
