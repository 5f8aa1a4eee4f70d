use crate::{ResultArtifact, SessionStatus};

/// What the generator view renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionViewModel {
    pub status: SessionStatus,
    pub progress_percent: u8,
    pub result_artifact: Option<ResultArtifact>,
    pub last_error: Option<String>,
    pub can_submit: bool,
    pub can_cancel: bool,
    pub dirty: bool,
}

impl SessionViewModel {
    /// Short status line for text front ends.
    pub fn summary(&self) -> String {
        match self.status {
            SessionStatus::Idle => "idle".to_string(),
            SessionStatus::Running => format!("generating... {}%", self.progress_percent),
            SessionStatus::Succeeded => match &self.result_artifact {
                Some(artifact) => format!("ready: {}", artifact.file_name),
                None => "ready".to_string(),
            },
            SessionStatus::Failed | SessionStatus::Cancelled => self
                .last_error
                .clone()
                .unwrap_or_else(|| format!("{:?}", self.status).to_lowercase()),
        }
    }
}
