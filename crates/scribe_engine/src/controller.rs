use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scribe_core::{
    update, BookVariant, Effect, GenerationRequest, GenerationSession, GenerationToken, Identity,
    JobFailure, Language, Msg, SessionStatus, SessionViewModel, SubmitError,
};
use scribe_logging::{scribe_debug, scribe_error, scribe_info, scribe_warn};

use crate::JobEvent;

/// Where the controller sends the effects the state machine asks for.
pub trait JobDispatcher {
    fn dispatch(&self, token: GenerationToken, request: GenerationRequest);
    fn request_cancel(&self, owner_id: &str);
    fn release_artifact(&self, url: &str);
}

/// Source of job events to feed back into a controller.
pub trait EventSource {
    fn try_next(&self) -> Option<JobEvent>;
}

/// Owners with a job currently running, shared by every controller of a process.
#[derive(Debug, Clone, Default)]
pub struct RunningOwners {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl RunningOwners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `owner_id` as running; false if it already was.
    pub fn try_claim(&self, owner_id: &str) -> bool {
        self.lock().insert(owner_id.to_string())
    }

    pub fn release(&self, owner_id: &str) {
        self.lock().remove(owner_id);
    }

    pub fn is_running(&self, owner_id: &str) -> bool {
        self.lock().contains(owner_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drives one view's generation session: feeds triggers and job events
/// through the pure state machine and executes the resulting effects.
///
/// Dropping the controller resets the session, releasing any displayed artifact.
pub struct SessionController<D: JobDispatcher> {
    state: GenerationSession,
    owner: Identity,
    dispatcher: D,
    owners: RunningOwners,
    holds_claim: bool,
}

impl<D: JobDispatcher> SessionController<D> {
    pub fn new(owner: Identity, dispatcher: D, owners: RunningOwners) -> Self {
        Self {
            state: GenerationSession::new(),
            owner,
            dispatcher,
            owners,
            holds_claim: false,
        }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn session(&self) -> &GenerationSession {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn view(&self) -> SessionViewModel {
        self.state.view()
    }

    /// Returns whether the view changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    /// Starts a generation. Rejected submissions leave the session untouched.
    pub fn submit(
        &mut self,
        prompt: &str,
        variant: BookVariant,
        language: Language,
    ) -> Result<GenerationToken, SubmitError> {
        if let Err(err) = self.state.check_submit(prompt) {
            scribe_debug!("Submit rejected: {}", err);
            return Err(err);
        }
        if !self.owners.try_claim(&self.owner.id) {
            scribe_warn!(
                "Submit rejected: owner={} already has a running generation",
                self.owner.id
            );
            return Err(SubmitError::ConcurrencyViolation);
        }
        self.holds_claim = true;

        let effects = self.apply(Msg::SubmitClicked {
            prompt: prompt.to_string(),
            variant,
            language,
            owner_id: self.owner.id.clone(),
        });
        let token = effects.iter().find_map(|effect| match effect {
            Effect::DispatchJob { token, .. } => Some(*token),
            _ => None,
        });
        self.execute(effects);
        match token {
            Some(token) => {
                scribe_info!(
                    "Generation {} started: variant={} language={}",
                    token,
                    variant.slug(),
                    language
                );
                Ok(token)
            }
            None => {
                self.release_claim();
                Err(SubmitError::Validation)
            }
        }
    }

    /// Cancels the running generation. The local transition happens at once;
    /// the remote side is only notified.
    pub fn cancel(&mut self) -> bool {
        let effects = self.apply(Msg::CancelClicked {
            owner_id: self.owner.id.clone(),
        });
        let cancelled = !effects.is_empty();
        if cancelled {
            scribe_info!("Generation cancelled by owner={}", self.owner.id);
        }
        self.execute(effects);
        cancelled
    }

    pub fn reset(&mut self) {
        let effects = self.apply(Msg::ResetClicked);
        self.execute(effects);
    }

    /// Routes a job event into the session; events of superseded submissions are dropped.
    pub fn handle_event(&mut self, event: JobEvent) {
        let stale = self.state.current_token() != Some(event.token());
        if stale {
            scribe_debug!("Ignoring stale event for job {}", event.token());
        }
        let msg = match event {
            JobEvent::Progress { token, percent } => Msg::JobProgress { token, percent },
            JobEvent::Completed {
                token,
                result: Ok(artifact),
            } => Msg::JobSucceeded {
                token,
                artifact: artifact.into(),
            },
            JobEvent::Completed {
                token,
                result: Err(err),
            } => {
                if stale {
                    scribe_debug!("Stale job {} failed: {}", token, err);
                } else {
                    scribe_error!("Job {} failed: {}", token, err);
                }
                Msg::JobFailed {
                    token,
                    failure: JobFailure::from(&err.kind),
                }
            }
        };
        let effects = self.apply(msg);
        self.execute(effects);
    }

    fn apply(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if self.state.status() != SessionStatus::Running {
            self.release_claim();
        }
        effects
    }

    fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::DispatchJob { token, request } => {
                    self.dispatcher.dispatch(token, request);
                }
                Effect::RequestCancel { owner_id } => {
                    self.dispatcher.request_cancel(&owner_id);
                }
                Effect::ReleaseArtifact { url } => {
                    self.dispatcher.release_artifact(&url);
                }
            }
        }
    }

    fn release_claim(&mut self) {
        if self.holds_claim {
            self.owners.release(&self.owner.id);
            self.holds_claim = false;
        }
    }
}

impl<D: JobDispatcher + EventSource> SessionController<D> {
    /// Drains pending job events. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let Some(event) = self.dispatcher.try_next() else {
                break;
            };
            self.handle_event(event);
            handled += 1;
        }
        handled
    }
}

impl<D: JobDispatcher> Drop for SessionController<D> {
    fn drop(&mut self) {
        self.reset();
        self.release_claim();
    }
}
