//! Scribe engine: job client IO, identity plumbing and effect execution.
mod blob;
mod client;
mod controller;
mod engine;
mod filename;
mod identity;
mod persist;
mod types;

pub use blob::BlobStore;
pub use client::{
    download_percent, ClientSettings, JobClient, ProgressSink, ProgressTracker, ReqwestJobClient,
    CANCEL_PATH, DEFAULT_BASE_URL, FALLBACK_TOTAL_BYTES,
};
pub use controller::{EventSource, JobDispatcher, RunningOwners, SessionController};
pub use engine::EngineHandle;
pub use filename::artifact_file_name;
pub use identity::{
    AuthBackend, AuthError, AuthSnapshot, IdentityAdapter, IdentityHub, ProviderUser,
    Subscription,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{FailureKind, GeneratedArtifact, JobEvent, TransportError};
