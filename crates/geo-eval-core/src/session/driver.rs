//! Runs session phases against the analysis service
//!
//! The driver is the single owner of the session. It opens one stream per
//! phase, feeds each decoded record through the reducer, publishes a view
//! after every applied record, and drops the stream as soon as the phase
//! ends or is cancelled.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::reducer::{Reducer, Transition};
use super::state::{AnalysisSession, Phase, SessionInputs, SessionView};
use crate::client::{AnalysisService, ByteStream};
use crate::error::{GeoError, Result};
use crate::stream::decode_events;

/// How a phase run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Completed,
    /// The cancellation token fired; the stream was dropped
    Cancelled,
}

pub struct SessionDriver<S: AnalysisService> {
    service: Arc<S>,
    reducer: Reducer,
    session: AnalysisSession,
    cancellation: CancellationToken,
    updates: Option<mpsc::UnboundedSender<SessionView>>,
    max_keywords: usize,
}

impl<S: AnalysisService> SessionDriver<S> {
    pub fn new(service: Arc<S>, reducer: Reducer, max_keywords: usize) -> Self {
        Self {
            service,
            reducer,
            session: AnalysisSession::new(max_keywords),
            cancellation: CancellationToken::new(),
            updates: None,
            max_keywords,
        }
    }

    /// Publish a [`SessionView`] on `tx` after every state change
    pub fn with_updates(mut self, tx: mpsc::UnboundedSender<SessionView>) -> Self {
        self.updates = Some(tx);
        self
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    /// Token that cancels the current or next phase run
    ///
    /// A fresh token is installed when a phase starts after a cancellation,
    /// so fetch it again for each phase.
    pub fn canceller(&mut self) -> CancellationToken {
        self.refresh_cancellation();
        self.cancellation.clone()
    }

    /// Cancel anything in flight and start over with an empty session
    pub fn reset(&mut self) {
        self.cancellation.cancel();
        self.cancellation = CancellationToken::new();
        self.session = AnalysisSession::new(self.max_keywords);
        info!("Session reset");
        self.publish();
    }

    pub fn add_keyword(&mut self, text: &str) -> Result<()> {
        self.session.add_keyword(text)?;
        self.publish();
        Ok(())
    }

    pub fn remove_keyword(&mut self, index: usize) -> Result<String> {
        let removed = self.session.remove_keyword(index)?;
        self.publish();
        Ok(removed)
    }

    /// Phase 1: extract keywords for the given brand
    pub async fn run_keywords_phase(&mut self, inputs: SessionInputs) -> Result<PhaseOutcome> {
        self.refresh_cancellation();
        let request = self.begin(|session| session.begin_keywords(inputs))?;
        let token = self.cancellation.clone();
        let service = Arc::clone(&self.service);

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(self.cancelled(Phase::Keywords)),
            opened = service.extract_keywords(&request) => opened,
        };
        self.drive(Phase::Keywords, opened, token).await
    }

    /// Phase 2: rank company citations for the edited keywords
    pub async fn run_rankings_phase(&mut self) -> Result<PhaseOutcome> {
        self.refresh_cancellation();
        let request = self.begin(|session| session.begin_rankings())?;
        let token = self.cancellation.clone();
        let service = Arc::clone(&self.service);

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(self.cancelled(Phase::Ranking)),
            opened = service.rank_citations(&request) => opened,
        };
        self.drive(Phase::Ranking, opened, token).await
    }

    fn begin<T>(&mut self, start: impl FnOnce(&mut AnalysisSession) -> Result<T>) -> Result<T> {
        let started = start(&mut self.session);
        self.publish();
        started
    }

    async fn drive(
        &mut self,
        phase: Phase,
        opened: Result<ByteStream>,
        token: CancellationToken,
    ) -> Result<PhaseOutcome> {
        let chunks = match opened {
            Ok(chunks) => chunks,
            Err(err) => return Err(self.fail(err)),
        };
        let events = decode_events(chunks);
        tokio::pin!(events);

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(self.cancelled(phase)),
                next = events.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    let applied = self.reducer.apply(&mut self.session, event);
                    self.publish();
                    match applied? {
                        Transition::PhaseCompleted => return Ok(PhaseOutcome::Completed),
                        Transition::Continue => {}
                    }
                }
                Some(Err(err)) => return Err(self.fail(err)),
                None => {
                    return Err(self.fail(GeoError::transport(format!(
                        "stream closed before {phase} completed"
                    ))))
                }
            }
        }
    }

    fn fail(&mut self, err: GeoError) -> GeoError {
        self.session.fail(&err);
        self.publish();
        err
    }

    fn cancelled(&mut self, phase: Phase) -> PhaseOutcome {
        info!("Phase {} cancelled", phase);
        self.session.cancel();
        self.publish();
        PhaseOutcome::Cancelled
    }

    fn refresh_cancellation(&mut self) {
        if self.cancellation.is_cancelled() {
            self.cancellation = CancellationToken::new();
        }
    }

    fn publish(&mut self) {
        if let Some(tx) = &self.updates {
            if tx.send(self.session.view()).is_err() {
                warn!("Session view receiver dropped; no further updates will be published");
                self.updates = None;
            }
        }
    }
}
