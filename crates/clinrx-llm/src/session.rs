//! Submission state for a single analysis form.
//!
//! Mirrors the front end's loading gate: one submission at a time, and a new
//! submission clears the previous report or error. This is not a lock; callers
//! sharing a session across tasks must serialize access themselves.

use clinrx_core::models::{AnalysisResult, RegimenInput};
use thiserror::Error;
use tracing::{debug, warn};

use crate::client::{AnalysisClient, Transport};
use crate::error::{AnalysisErrorKind, ClientResult};

/// Returned by `begin` while a submission is in flight.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("An analysis is already in progress")]
pub struct SessionBusy;

/// Where the current submission stands.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Failed {
        message: String,
        kind: AnalysisErrorKind,
    },
    Ready(Box<AnalysisResult>),
}

/// Analysis session for one form.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    state: SessionState,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a submission. Clears any previous report or error.
    pub fn begin(&mut self) -> Result<(), SessionBusy> {
        if self.is_loading() {
            debug!("Rejected submission while loading");
            return Err(SessionBusy);
        }
        self.state = SessionState::Loading;
        Ok(())
    }

    /// Record the outcome of the in-flight submission.
    pub fn complete(&mut self, outcome: ClientResult<AnalysisResult>) {
        if !self.is_loading() {
            warn!("Discarding analysis outcome with no submission in flight");
            return;
        }
        self.state = match outcome {
            Ok(result) => SessionState::Ready(Box::new(result)),
            Err(e) => SessionState::Failed {
                message: e.user_message(),
                kind: e.kind(),
            },
        };
    }

    /// Begin, run the analysis and record its outcome.
    ///
    /// Dropping the returned future before it resolves returns the session to `Idle`.
    pub async fn submit<T: Transport>(
        &mut self,
        client: &AnalysisClient<T>,
        input: &RegimenInput,
    ) -> Result<&SessionState, SessionBusy> {
        self.begin()?;

        let mut guard = LoadingGuard { session: &mut *self };
        let outcome = client.analyze(input).await;
        guard.session.complete(outcome);
        drop(guard);

        Ok(&self.state)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            SessionState::Ready(result) => Some(result.as_ref()),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Resets a submission that is still `Loading` when dropped.
struct LoadingGuard<'a> {
    session: &'a mut AnalysisSession,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.session.is_loading() {
            debug!("Analysis abandoned before completion");
            self.session.state = SessionState::Idle;
        }
    }
}
