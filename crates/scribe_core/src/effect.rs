use crate::{GenerationRequest, GenerationToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the remote job; every event it produces must carry `token`.
    DispatchJob {
        token: GenerationToken,
        request: GenerationRequest,
    },
    /// Advisory cancel for the owner's in-flight job.
    RequestCancel { owner_id: String },
    /// The artifact behind `url` is no longer displayed and can be freed.
    ReleaseArtifact { url: String },
}
