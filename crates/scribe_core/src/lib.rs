//! Scribe core: pure generation-session state machine, request model and route guard.
mod effect;
mod guard;
mod identity;
mod msg;
mod request;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use guard::{resolve_destination, Destination};
pub use identity::Identity;
pub use msg::Msg;
pub use request::{
    language_directive, BookVariant, GenerationRequest, Language, UnknownLanguage, UnknownVariant,
};
pub use state::{
    GenerationSession, GenerationToken, JobFailure, ResultArtifact, SessionStatus, SubmitError,
    CANCELLED_MESSAGE, GENERIC_FAILURE_MESSAGE, TIMEOUT_FAILURE_MESSAGE,
};
pub use update::update;
pub use view_model::SessionViewModel;
