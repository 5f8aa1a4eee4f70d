use std::fmt;

use thiserror::Error;

use crate::view_model::SessionViewModel;
use crate::GenerationRequest;

/// Message shown when a job fails for anything but a timeout.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to generate book. Please check the backend connection.";
/// Message shown when the transport gave up waiting.
pub const TIMEOUT_FAILURE_MESSAGE: &str = "Generation timed out. Please try again.";
/// Message recorded when the user cancels a running job.
pub const CANCELLED_MESSAGE: &str = "cancelled by user";

/// Tags every event of one submission so superseded events can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GenerationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Locally addressable handle to a finished PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultArtifact {
    pub url: String,
    pub file_name: String,
}

/// Failure classes the job client boundary reports; raw transport detail stays in the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    Network,
    Timeout,
    HttpStatus(u16),
    InvalidResponse,
}

impl JobFailure {
    pub fn user_message(&self) -> &'static str {
        match self {
            JobFailure::Timeout => TIMEOUT_FAILURE_MESSAGE,
            JobFailure::Network | JobFailure::HttpStatus(_) | JobFailure::InvalidResponse => {
                GENERIC_FAILURE_MESSAGE
            }
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailure::Network => write!(f, "network error"),
            JobFailure::Timeout => write!(f, "timeout"),
            JobFailure::HttpStatus(code) => write!(f, "http status {code}"),
            JobFailure::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

/// Why a submission was turned away before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("prompt is empty")]
    Validation,
    #[error("a generation is already running for this user")]
    ConcurrencyViolation,
}

/// One generation attempt's state machine.
///
/// `result_artifact` is set only in `Succeeded`, `last_error` only in `Failed`
/// and `Cancelled`, and `current_token` only in `Running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSession {
    status: SessionStatus,
    progress_percent: u8,
    result_artifact: Option<ResultArtifact>,
    last_error: Option<String>,
    current_token: Option<GenerationToken>,
    next_token: u64,
    last_request: Option<GenerationRequest>,
    dirty: bool,
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            progress_percent: 0,
            result_artifact: None,
            last_error: None,
            current_token: None,
            next_token: 1,
            last_request: None,
            dirty: false,
        }
    }
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn result_artifact(&self) -> Option<&ResultArtifact> {
        self.result_artifact.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current_token(&self) -> Option<GenerationToken> {
        self.current_token
    }

    /// The most recently accepted request, kept for display after the job ends.
    pub fn last_request(&self) -> Option<&GenerationRequest> {
        self.last_request.as_ref()
    }

    pub fn view(&self) -> SessionViewModel {
        SessionViewModel {
            status: self.status,
            progress_percent: self.progress_percent,
            result_artifact: self.result_artifact.clone(),
            last_error: self.last_error.clone(),
            can_submit: self.status != SessionStatus::Running,
            can_cancel: self.status == SessionStatus::Running,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Guard for `SubmitClicked`: non-blank prompt and nothing in flight.
    pub fn check_submit(&self, prompt: &str) -> Result<(), SubmitError> {
        if prompt.trim().is_empty() {
            return Err(SubmitError::Validation);
        }
        if self.status == SessionStatus::Running {
            return Err(SubmitError::ConcurrencyViolation);
        }
        Ok(())
    }

    /// Enters `Running` with a fresh token. Returns the token and the url of
    /// the artifact that was displayed before, if any.
    pub(crate) fn begin(&mut self, request: GenerationRequest) -> (GenerationToken, Option<String>) {
        let released = self.clear_outcome();
        let token = GenerationToken(self.next_token);
        self.next_token += 1;
        self.status = SessionStatus::Running;
        self.progress_percent = 0;
        self.current_token = Some(token);
        self.last_request = Some(request);
        self.mark_dirty();
        (token, released)
    }

    pub(crate) fn is_current(&self, token: GenerationToken) -> bool {
        self.status == SessionStatus::Running && self.current_token == Some(token)
    }

    /// Applies a progress report. Lower values than already shown are ignored.
    pub(crate) fn apply_progress(&mut self, token: GenerationToken, percent: u8) -> bool {
        if !self.is_current(token) || percent < self.progress_percent {
            return false;
        }
        let percent = percent.min(100);
        if percent != self.progress_percent {
            self.progress_percent = percent;
            self.mark_dirty();
        }
        true
    }

    pub(crate) fn apply_success(&mut self, token: GenerationToken, artifact: ResultArtifact) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.status = SessionStatus::Succeeded;
        self.progress_percent = 100;
        self.result_artifact = Some(artifact);
        self.current_token = None;
        self.mark_dirty();
        true
    }

    pub(crate) fn apply_failure(&mut self, token: GenerationToken, failure: &JobFailure) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.status = SessionStatus::Failed;
        self.last_error = Some(failure.user_message().to_string());
        self.current_token = None;
        self.mark_dirty();
        true
    }

    /// Moves a running session to `Cancelled`; the in-flight token is dropped.
    pub(crate) fn cancel(&mut self) -> bool {
        if self.status != SessionStatus::Running {
            return false;
        }
        self.status = SessionStatus::Cancelled;
        self.progress_percent = 0;
        self.last_error = Some(CANCELLED_MESSAGE.to_string());
        self.current_token = None;
        self.mark_dirty();
        true
    }

    /// Back to `Idle`. Returns the url of the artifact that was displayed, if any.
    pub(crate) fn reset(&mut self) -> Option<String> {
        let released = self.clear_outcome();
        if self.status != SessionStatus::Idle || self.progress_percent != 0 {
            self.mark_dirty();
        }
        self.status = SessionStatus::Idle;
        self.progress_percent = 0;
        self.current_token = None;
        released
    }

    fn clear_outcome(&mut self) -> Option<String> {
        if self.last_error.take().is_some() {
            self.mark_dirty();
        }
        let released = self.result_artifact.take().map(|artifact| artifact.url);
        if released.is_some() {
            self.mark_dirty();
        }
        released
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
