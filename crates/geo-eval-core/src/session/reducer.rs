//! Applies stream records to a session
//!
//! `reduce` is pure: it builds the next session from the current one and a
//! record, so an event is either applied whole or not at all.

use std::sync::Arc;

use tracing::{debug, info};

use super::labels::{DefaultStageLabels, StageLabels};
use super::state::{AnalysisSession, Phase, Stage};
use crate::aggregate::CompanyAggregator;
use crate::error::{GeoError, Result};
use crate::stream::{CompletedPayload, StreamEvent};

/// What an applied record meant for the active phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Phase still running
    Continue,
    /// Terminal success; stop reading the stream
    PhaseCompleted,
}

#[derive(Clone)]
pub struct Reducer {
    labels: Arc<dyn StageLabels>,
    aggregator: CompanyAggregator,
}

impl Reducer {
    pub fn new(labels: impl StageLabels + 'static, aggregator: CompanyAggregator) -> Self {
        Self {
            labels: Arc::new(labels),
            aggregator,
        }
    }

    /// Compute the session that results from applying `event`
    ///
    /// An `error` record, or a record that does not fit the active phase,
    /// comes back as `Err` and the input session is untouched.
    pub fn reduce(
        &self,
        session: &AnalysisSession,
        event: StreamEvent,
    ) -> Result<(AnalysisSession, Transition)> {
        let mut next = session.clone();
        let stage_name = event.stage_name();

        let phase = match next.phase {
            Some(phase) => phase,
            // A stream may begin before the caller marked the phase as started
            None if next.stage == Stage::Input
                && matches!(event, StreamEvent::Initializing { .. }) =>
            {
                next.phase = Some(Phase::Keywords);
                Phase::Keywords
            }
            None => {
                return Err(GeoError::framing(format!(
                    "'{stage_name}' record received with no phase in flight"
                )))
            }
        };
        let language = next.inputs.language;

        let transition = match event {
            StreamEvent::Initializing { session_id } => {
                if let Some(id) = session_id {
                    next.session_id = Some(id);
                }
                next.progress_label = Some(self.labels.initializing(language));
                if phase == Phase::Keywords {
                    next.stage = Stage::KeywordsInProgress;
                }
                Transition::Continue
            }
            StreamEvent::Progress { operation } => {
                next.progress_label = Some(self.labels.label(&operation, language));
                Transition::Continue
            }
            StreamEvent::PartialResults { graph } => {
                if phase != Phase::Ranking {
                    return Err(GeoError::framing(format!(
                        "partial results received during {phase}"
                    )));
                }
                next.results = self.aggregator.aggregate(&graph);
                Transition::Continue
            }
            StreamEvent::Completed { payload } => {
                match (phase, payload) {
                    (Phase::Keywords, CompletedPayload::Keywords(keywords)) => {
                        complete_keywords(&mut next, keywords)
                    }
                    (Phase::Keywords, CompletedPayload::Empty) => {
                        complete_keywords(&mut next, Vec::new())
                    }
                    (Phase::Ranking, CompletedPayload::Graph(graph)) => {
                        next.results = self.aggregator.aggregate(&graph);
                        next.stage = Stage::ResultsReady;
                    }
                    (Phase::Ranking, CompletedPayload::Empty) => {
                        next.results = Vec::new();
                        next.stage = Stage::ResultsReady;
                    }
                    (phase, _) => {
                        return Err(GeoError::framing(format!(
                            "completed payload does not match the {phase} phase"
                        )))
                    }
                }
                info!("Phase {} completed ({:?})", phase, next.stage);
                next.phase = None;
                next.progress_label = None;
                Transition::PhaseCompleted
            }
            StreamEvent::Error { message } => return Err(GeoError::Protocol(message)),
        };

        debug!("Applied '{}' record -> {:?}", stage_name, next.stage);
        Ok((next, transition))
    }

    /// Apply `event` in place; on failure the session moves to `Error` keeping its data
    pub fn apply(&self, session: &mut AnalysisSession, event: StreamEvent) -> Result<Transition> {
        match self.reduce(session, event) {
            Ok((next, transition)) => {
                *session = next;
                Ok(transition)
            }
            Err(err) => {
                session.fail(&err);
                Err(err)
            }
        }
    }
}

/// The server's list is taken as-is; the keyword cap only applies to user edits
fn complete_keywords(session: &mut AnalysisSession, keywords: Vec<String>) {
    session.edited_keywords = keywords.clone();
    session.proposed_keywords = keywords;
    session.stage = Stage::KeywordsReady;
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(DefaultStageLabels, CompanyAggregator::new())
    }
}

impl std::fmt::Debug for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer")
            .field("aggregator", &self.aggregator)
            .finish_non_exhaustive()
    }
}
