use std::fmt;

use scribe_core::{GenerationToken, JobFailure, ResultArtifact};

/// Events the engine reports back to the controller, tagged with the
/// submission they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Progress {
        token: GenerationToken,
        percent: u8,
    },
    Completed {
        token: GenerationToken,
        result: Result<GeneratedArtifact, TransportError>,
    },
}

impl JobEvent {
    pub fn token(&self) -> GenerationToken {
        match self {
            JobEvent::Progress { token, .. } | JobEvent::Completed { token, .. } => *token,
        }
    }
}

/// A downloaded PDF held in the engine's blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub url: String,
    pub file_name: String,
    pub byte_len: u64,
}

impl From<GeneratedArtifact> for ResultArtifact {
    fn from(artifact: GeneratedArtifact) -> Self {
        ResultArtifact {
            url: artifact.url,
            file_name: artifact.file_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    EmptyPayload,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::EmptyPayload => write!(f, "empty payload"),
        }
    }
}

impl From<&FailureKind> for JobFailure {
    fn from(kind: &FailureKind) -> Self {
        match kind {
            FailureKind::HttpStatus(code) => JobFailure::HttpStatus(*code),
            FailureKind::Timeout => JobFailure::Timeout,
            FailureKind::EmptyPayload => JobFailure::InvalidResponse,
            FailureKind::InvalidUrl | FailureKind::Network => JobFailure::Network,
        }
    }
}
