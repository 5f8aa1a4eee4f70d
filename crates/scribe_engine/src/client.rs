use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use scribe_core::GenerationRequest;
use scribe_logging::{scribe_debug, scribe_info, scribe_warn};
use serde::Serialize;

use crate::{artifact_file_name, BlobStore, FailureKind, GeneratedArtifact, TransportError};

/// Hosted generation service.
pub const DEFAULT_BASE_URL: &str = "https://projectx-production-d880.up.railway.app";
pub const CANCEL_PATH: &str = "/api/cancelGeneration";
/// Assumed payload size when the response carries no `Content-Length`.
pub const FALLBACK_TOTAL_BYTES: u64 = 10_000_000;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// `None` waits for the service as long as it takes.
    pub request_timeout: Option<Duration>,
    pub fallback_total_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            fallback_total_bytes: FALLBACK_TOTAL_BYTES,
        }
    }
}

/// Receives download progress in percent, `0..=99`, never decreasing.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

#[async_trait::async_trait]
pub trait JobClient: Send + Sync {
    /// Runs one generation and returns the stored artifact.
    async fn submit(
        &self,
        request: &GenerationRequest,
        sink: &dyn ProgressSink,
    ) -> Result<GeneratedArtifact, TransportError>;

    /// Advisory cancel for the owner's in-flight job. Failures are logged, not returned.
    async fn request_cancel(&self, owner_id: &str);
}

/// `loaded / total` as a rounded percentage, capped at 99 until the payload is complete.
pub fn download_percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let total = u128::from(total);
    let percent = (u128::from(loaded) * 100 + total / 2) / total;
    percent.min(99) as u8
}

/// Turns received byte counts into monotonic progress reports.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: u64,
    loaded: u64,
    last_reported: Option<u8>,
}

impl ProgressTracker {
    pub fn new(content_length: Option<u64>, fallback_total: u64) -> Self {
        let total = content_length
            .filter(|len| *len > 0)
            .unwrap_or(fallback_total);
        Self {
            total,
            loaded: 0,
            last_reported: None,
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    /// Records `chunk_len` more bytes; returns a percent only when it moved forward.
    pub fn advance(&mut self, chunk_len: usize) -> Option<u8> {
        self.loaded = self.loaded.saturating_add(chunk_len as u64);
        let percent = download_percent(self.loaded, self.total);
        match self.last_reported {
            Some(last) if percent <= last => None,
            _ => {
                self.last_reported = Some(percent);
                Some(percent)
            }
        }
    }
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    #[serde(rename = "userId")]
    user_id: &'a str,
}

#[derive(Serialize)]
struct CancelBody<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct ReqwestJobClient {
    settings: ClientSettings,
    blobs: Arc<BlobStore>,
}

impl ReqwestJobClient {
    pub fn new(settings: ClientSettings, blobs: Arc<BlobStore>) -> Self {
        Self { settings, blobs }
    }

    pub fn blobs(&self) -> &Arc<BlobStore> {
        &self.blobs
    }

    fn build_client(&self) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder().connect_timeout(self.settings.connect_timeout);
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, TransportError> {
        let raw = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
        reqwest::Url::parse(&raw)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, format!("{raw}: {err}")))
    }

    /// POSTs `body` as JSON; `accept` is only set when the response body is used.
    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        accept: Option<&str>,
    ) -> Result<reqwest::Response, TransportError> {
        let url = self.endpoint(path)?;
        let payload = serde_json::to_vec(body)
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;
        let client = self.build_client()?;

        let mut builder = client.post(url).header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        if let Some(accept) = accept {
            builder = builder.header(ACCEPT, accept);
        }
        let response = builder
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl JobClient for ReqwestJobClient {
    async fn submit(
        &self,
        request: &GenerationRequest,
        sink: &dyn ProgressSink,
    ) -> Result<GeneratedArtifact, TransportError> {
        let variant = request.variant();
        scribe_info!(
            "Submitting {} generation for owner={} prompt_len={}",
            variant.slug(),
            request.owner_id(),
            request.prompt_text().len()
        );
        let body = GenerateBody {
            prompt: request.prompt_text(),
            user_id: request.owner_id(),
        };
        let response = self
            .post_json(variant.endpoint_path(), &body, Some(PDF_CONTENT_TYPE))
            .await?;

        if let Some(ct) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            if !ct.starts_with(PDF_CONTENT_TYPE) {
                scribe_warn!("Expected {} but service sent {}", PDF_CONTENT_TYPE, ct);
            }
        }

        let mut tracker =
            ProgressTracker::new(response.content_length(), self.settings.fallback_total_bytes);
        if let Some(percent) = tracker.advance(0) {
            sink.report(percent);
        }

        let mut payload = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            payload.extend_from_slice(&chunk);
            if let Some(percent) = tracker.advance(chunk.len()) {
                sink.report(percent);
            }
        }

        if payload.is_empty() {
            return Err(TransportError::new(
                FailureKind::EmptyPayload,
                "service returned no document",
            ));
        }

        let byte_len = tracker.loaded();
        let url = self.blobs.insert(payload.freeze());
        let file_name = artifact_file_name(request.topic());
        scribe_info!("Stored {} ({} bytes) as {}", file_name, byte_len, url);

        Ok(GeneratedArtifact {
            url,
            file_name,
            byte_len,
        })
    }

    async fn request_cancel(&self, owner_id: &str) {
        let body = CancelBody { user_id: owner_id };
        match self.post_json(CANCEL_PATH, &body, None).await {
            Ok(_) => scribe_debug!("Cancel acknowledged for owner={}", owner_id),
            Err(err) => scribe_warn!("Cancel request for owner={} failed: {}", owner_id, err),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
