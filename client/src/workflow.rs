use std::mem;

use shared::Endpoint;
use strum_macros::Display;

use crate::classify::{self, WorkflowError};
use crate::credentials::CredentialResolver;
use crate::endpoint;
use crate::intake::{self, FileSource, PreviewStore, UploadCandidate};
use crate::normalize::InferenceResult;
use crate::transport::{InferenceClient, RawResponse, TransportFailure, UploadPart};

/// Everything needed to send one candidate. Built fresh per submission.
#[derive(Debug)]
pub struct InferenceRequest {
    pub candidate: UploadCandidate,
    pub endpoint: Endpoint,
    pub auth_header: Option<String>,
}

#[derive(Debug)]
pub enum WorkflowState {
    Idle,
    CandidateSelected(UploadCandidate),
    Submitting(InferenceRequest),
    Succeeded(InferenceResult),
    Failed(WorkflowError),
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Idle => Phase::Idle,
            WorkflowState::CandidateSelected(_) => Phase::CandidateSelected,
            WorkflowState::Submitting(_) => Phase::Submitting,
            WorkflowState::Succeeded(_) => Phase::Succeeded,
            WorkflowState::Failed(_) => Phase::Failed,
        }
    }
}

/// Data-free tag of a [`WorkflowState`], for notifications and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Phase {
    Idle,
    CandidateSelected,
    Submitting,
    Succeeded,
    Failed,
}

/// Hook for hosts that render state changes or want debug instrumentation.
pub trait WorkflowObserver: Send + Sync {
    fn on_transition(&self, _generation: u64, _from: Phase, _to: Phase) {}

    fn on_dispatch(&self, _generation: u64, _endpoint: Endpoint, _authenticated: bool) {}

    fn on_stale_result(&self, _ticket: u64, _current: u64) {}
}

/// Observer that writes every notification to the debug log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl WorkflowObserver for LogObserver {
    fn on_transition(&self, generation: u64, from: Phase, to: Phase) {
        log::debug!("[gen {}] {} -> {}", generation, from, to);
    }

    fn on_dispatch(&self, generation: u64, endpoint: Endpoint, authenticated: bool) {
        log::debug!(
            "[gen {}] dispatching to {} endpoint (token present: {})",
            generation,
            endpoint,
            authenticated
        );
    }

    fn on_stale_result(&self, ticket: u64, current: u64) {
        log::debug!("[gen {}] dropped result from superseded generation {}", current, ticket);
    }
}

/// Ticket for a request that left the workflow. Its result is only applied
/// while the workflow is still on the same generation.
#[derive(Debug)]
pub struct PendingSubmission {
    generation: u64,
    endpoint: Endpoint,
    auth_header: Option<String>,
    part: UploadPart,
}

impl PendingSubmission {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_header.is_some()
    }

    /// Sends the upload. Consumes the ticket, so each `begin_submit` puts at
    /// most one request on the wire:
    ///
    /// ```compile_fail
    /// # async fn twice(workflow: &mut client::Workflow, http: &client::InferenceClient) {
    /// let ticket = workflow.begin_submit(&client::Anonymous).unwrap();
    /// let _ = ticket.dispatch(http).await;
    /// let _ = ticket.dispatch(http).await;
    /// # }
    /// ```
    ///
    /// Returns the ticket's generation with the outcome, ready for
    /// [`Workflow::complete`].
    pub async fn dispatch(
        self,
        client: &InferenceClient,
    ) -> (u64, Result<RawResponse, TransportFailure>) {
        let outcome = client
            .submit(&self.part, self.endpoint, self.auth_header.as_deref())
            .await;
        (self.generation, outcome)
    }
}

/// One upload-and-diagnose lifecycle.
///
/// `Idle -> CandidateSelected -> Submitting -> Succeeded | Failed`. A new
/// selection is accepted from any state and always lands in
/// `CandidateSelected`; submitting is only accepted from `CandidateSelected`
/// and is otherwise ignored. Every selection, clear or abandon starts a new
/// generation, and results tagged with an older generation are discarded.
pub struct Workflow {
    state: WorkflowState,
    generation: u64,
    previews: PreviewStore,
    // Candidate kept after a terminal state so its preview stays on screen
    // next to the result.
    retained: Option<UploadCandidate>,
    observer: Option<Box<dyn WorkflowObserver>>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self::with_previews(PreviewStore::new())
    }

    pub fn with_previews(previews: PreviewStore) -> Self {
        Self {
            state: WorkflowState::Idle,
            generation: 0,
            previews,
            retained: None,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl WorkflowObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    pub fn candidate(&self) -> Option<&UploadCandidate> {
        match &self.state {
            WorkflowState::CandidateSelected(candidate) => Some(candidate),
            WorkflowState::Submitting(request) => Some(&request.candidate),
            _ => self.retained.as_ref(),
        }
    }

    pub fn preview_uri(&self) -> Option<&str> {
        self.candidate().map(|c| c.preview().uri())
    }

    pub fn result(&self) -> Option<&InferenceResult> {
        match &self.state {
            WorkflowState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        match &self.state {
            WorkflowState::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.state, WorkflowState::CandidateSelected(_))
    }

    /// Validates and takes a new image. On failure nothing changes and the
    /// validation error is returned for the host to show in place.
    pub fn select_file(&mut self, source: FileSource) -> Result<(), WorkflowError> {
        let candidate = intake::accept(source, &self.previews)?;

        if let WorkflowState::Submitting(request) = &self.state {
            log::info!(
                "Superseding in-flight {} submission of generation {}",
                request.endpoint,
                self.generation
            );
        }

        self.retained = None;
        self.generation += 1;
        self.transition(WorkflowState::CandidateSelected(candidate));
        Ok(())
    }

    /// Drops the selected image. Only meaningful before submission.
    pub fn clear_selection(&mut self) -> bool {
        if !self.can_submit() {
            log::debug!("Ignoring clear while {}", self.phase());
            return false;
        }
        self.generation += 1;
        self.transition(WorkflowState::Idle);
        true
    }

    /// "Analyze another image" after a successful diagnosis.
    pub fn analyze_another(&mut self) -> bool {
        if self.phase() != Phase::Succeeded {
            log::debug!("Ignoring analyze-another while {}", self.phase());
            return false;
        }
        self.retained = None;
        self.generation += 1;
        self.transition(WorkflowState::Idle);
        true
    }

    /// The host navigated away. Any in-flight result will be discarded.
    pub fn abandon(&mut self) {
        self.retained = None;
        self.generation += 1;
        self.transition(WorkflowState::Idle);
    }

    /// Moves `CandidateSelected` to `Submitting` and hands back the request
    /// to send. Returns `None`, without touching anything, from any other
    /// state.
    pub fn begin_submit(
        &mut self,
        credentials: &dyn CredentialResolver,
    ) -> Option<PendingSubmission> {
        let candidate = match mem::replace(&mut self.state, WorkflowState::Idle) {
            WorkflowState::CandidateSelected(candidate) => candidate,
            other => {
                self.state = other;
                log::warn!("Ignoring submit while {}", self.phase());
                return None;
            }
        };

        let token = credentials.current_token();
        let route = endpoint::select(token.as_deref());
        let pending = PendingSubmission {
            generation: self.generation,
            endpoint: route.endpoint,
            auth_header: route.auth_header.clone(),
            part: candidate.upload_part(),
        };

        if let Some(observer) = &self.observer {
            observer.on_dispatch(self.generation, pending.endpoint, pending.is_authenticated());
        }

        self.state = WorkflowState::Submitting(InferenceRequest {
            candidate,
            endpoint: route.endpoint,
            auth_header: route.auth_header,
        });
        self.notify(Phase::CandidateSelected, Phase::Submitting);
        Some(pending)
    }

    /// Applies the outcome of the submission tagged `generation`. Returns
    /// `false` when the outcome is stale and was dropped.
    pub fn complete(
        &mut self,
        generation: u64,
        outcome: Result<RawResponse, TransportFailure>,
    ) -> bool {
        if generation != self.generation || self.phase() != Phase::Submitting {
            log::debug!(
                "Discarding result of generation {} (current generation {}, {})",
                generation,
                self.generation,
                self.phase()
            );
            if let Some(observer) = &self.observer {
                observer.on_stale_result(generation, self.generation);
            }
            return false;
        }

        let next = match classify::classify(outcome) {
            Ok(result) => {
                log::info!(
                    "Diagnosis received: {} ({:?})",
                    result.disease_label,
                    result.confidence
                );
                WorkflowState::Succeeded(result)
            }
            Err(error) => {
                log::warn!("Analysis failed ({}): {}", error.kind, error.message);
                WorkflowState::Failed(error)
            }
        };

        if let WorkflowState::Submitting(request) = self.transition(next) {
            self.retained = Some(request.candidate);
        }
        true
    }

    /// Selects the route, sends the candidate and applies the outcome.
    ///
    /// Holds `&mut self` until the request resolves, so no other operation on
    /// this workflow can run in between. Hosts that need to supersede or
    /// abandon mid-flight use [`Workflow::begin_submit`] and
    /// [`Workflow::complete`] instead.
    pub async fn submit(
        &mut self,
        client: &InferenceClient,
        credentials: &dyn CredentialResolver,
    ) -> bool {
        let Some(pending) = self.begin_submit(credentials) else {
            return false;
        };
        let (generation, outcome) = pending.dispatch(client).await;
        self.complete(generation, outcome)
    }

    fn transition(&mut self, next: WorkflowState) -> WorkflowState {
        let previous = mem::replace(&mut self.state, next);
        self.notify(previous.phase(), self.phase());
        previous
    }

    fn notify(&self, from: Phase, to: Phase) {
        if let Some(observer) = &self.observer {
            observer.on_transition(self.generation, from, to);
        }
    }
}
