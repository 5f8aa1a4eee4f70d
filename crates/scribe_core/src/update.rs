use crate::{Effect, GenerationRequest, GenerationSession, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// Events tagged with a token other than the running one are dropped, except
/// that a stale artifact is still handed back for release.
pub fn update(mut state: GenerationSession, msg: Msg) -> (GenerationSession, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitClicked {
            prompt,
            variant,
            language,
            owner_id,
        } => {
            if state.check_submit(&prompt).is_err() {
                return (state, Vec::new());
            }
            let request = GenerationRequest::new(&prompt, variant, language, owner_id);
            let (token, released) = state.begin(request.clone());
            let mut effects = Vec::with_capacity(1 + usize::from(released.is_some()));
            if let Some(url) = released {
                effects.push(Effect::ReleaseArtifact { url });
            }
            effects.push(Effect::DispatchJob { token, request });
            effects
        }
        Msg::JobProgress { token, percent } => {
            state.apply_progress(token, percent);
            Vec::new()
        }
        Msg::JobSucceeded { token, artifact } => {
            let url = artifact.url.clone();
            if state.apply_success(token, artifact) {
                Vec::new()
            } else {
                vec![Effect::ReleaseArtifact { url }]
            }
        }
        Msg::JobFailed { token, failure } => {
            state.apply_failure(token, &failure);
            Vec::new()
        }
        Msg::CancelClicked { owner_id } => {
            if state.cancel() {
                vec![Effect::RequestCancel { owner_id }]
            } else {
                Vec::new()
            }
        }
        Msg::ResetClicked => state
            .reset()
            .map(|url| vec![Effect::ReleaseArtifact { url }])
            .unwrap_or_default(),
    };

    (state, effects)
}
