use crate::{BookVariant, GenerationToken, JobFailure, Language, ResultArtifact};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked for a new book.
    SubmitClicked {
        prompt: String,
        variant: BookVariant,
        language: Language,
        owner_id: String,
    },
    /// Download progress of the in-flight job.
    JobProgress { token: GenerationToken, percent: u8 },
    /// The job delivered its artifact.
    JobSucceeded {
        token: GenerationToken,
        artifact: ResultArtifact,
    },
    /// The job failed for a reason other than cancellation.
    JobFailed {
        token: GenerationToken,
        failure: JobFailure,
    },
    /// User clicked Cancel.
    CancelClicked { owner_id: String },
    /// User dismissed the result or error, or the view went away.
    ResetClicked,
}
