use std::io;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use futures_util::future::join_all;
use scribe_core::{GenerationRequest, GenerationToken};
use scribe_logging::{scribe_debug, scribe_error, scribe_info, scribe_warn};

use crate::client::{ClientSettings, JobClient, ProgressSink, ReqwestJobClient};
use crate::{BlobStore, EventSource, JobDispatcher, JobEvent};

/// How long shutdown waits for advisory cancels that are still in flight.
const CANCEL_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

enum EngineCommand {
    Submit {
        token: GenerationToken,
        request: GenerationRequest,
    },
    Cancel {
        owner_id: String,
    },
}

/// Runs job client calls on a background tokio runtime and reports their
/// events over a channel, so the control thread never blocks on IO.
///
/// Dropping the handle abandons running generations but waits briefly for
/// pending cancel notifications to go out.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<JobEvent>,
    blobs: Arc<BlobStore>,
    worker: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Engine backed by the HTTP job client.
    pub fn new(settings: ClientSettings) -> io::Result<Self> {
        let blobs = Arc::new(BlobStore::new());
        let client = Arc::new(ReqwestJobClient::new(settings, blobs.clone()));
        Self::with_client(client, blobs)
    }

    /// Engine backed by any job client; `blobs` must be the store the client writes to.
    pub fn with_client(client: Arc<dyn JobClient>, blobs: Arc<BlobStore>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("scribe-engine")
            .enable_all()
            .build()?;

        let worker = thread::Builder::new()
            .name("scribe-engine-commands".to_string())
            .spawn(move || {
                let mut pending_cancels = Vec::new();
                while let Ok(command) = cmd_rx.recv() {
                    let client = client.clone();
                    let event_tx = event_tx.clone();
                    let is_cancel = matches!(command, EngineCommand::Cancel { .. });
                    let task = runtime.spawn(async move {
                        handle_command(client.as_ref(), command, event_tx).await;
                    });
                    if is_cancel {
                        pending_cancels.push(task);
                    }
                    pending_cancels.retain(|task| !task.is_finished());
                }
                scribe_debug!("Engine command channel closed");
                if !pending_cancels.is_empty() {
                    let flushed = runtime.block_on(tokio::time::timeout(
                        CANCEL_FLUSH_TIMEOUT,
                        join_all(pending_cancels),
                    ));
                    if flushed.is_err() {
                        scribe_warn!("Cancel requests still pending at shutdown were dropped");
                    }
                }
            })?;

        Ok(Self {
            cmd_tx,
            event_rx,
            blobs,
            worker: Some(worker),
        })
    }

    pub fn blobs(&self) -> &Arc<BlobStore> {
        &self.blobs
    }

    pub fn try_recv(&self) -> Option<JobEvent> {
        self.event_rx.try_recv().ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            scribe_error!("Engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        // Closing the command channel ends the worker loop.
        let (closed_tx, _) = mpsc::channel();
        drop(std::mem::replace(&mut self.cmd_tx, closed_tx));
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                scribe_error!("Engine worker panicked");
            }
        }
    }
}

impl JobDispatcher for EngineHandle {
    fn dispatch(&self, token: GenerationToken, request: GenerationRequest) {
        self.send(EngineCommand::Submit { token, request });
    }

    fn request_cancel(&self, owner_id: &str) {
        self.send(EngineCommand::Cancel {
            owner_id: owner_id.to_string(),
        });
    }

    fn release_artifact(&self, url: &str) {
        self.blobs.revoke(url);
    }
}

impl EventSource for EngineHandle {
    fn try_next(&self) -> Option<JobEvent> {
        self.try_recv()
    }
}

struct ChannelProgressSink {
    token: GenerationToken,
    tx: mpsc::Sender<JobEvent>,
}

impl ProgressSink for ChannelProgressSink {
    fn report(&self, percent: u8) {
        let _ = self.tx.send(JobEvent::Progress {
            token: self.token,
            percent,
        });
    }
}

async fn handle_command(
    client: &dyn JobClient,
    command: EngineCommand,
    event_tx: mpsc::Sender<JobEvent>,
) {
    match command {
        EngineCommand::Submit { token, request } => {
            let sink = ChannelProgressSink {
                token,
                tx: event_tx.clone(),
            };
            let result = client.submit(&request, &sink).await;
            scribe_info!(
                "Job {} finished: {}",
                token,
                if result.is_ok() { "ok" } else { "failed" }
            );
            let _ = event_tx.send(JobEvent::Completed { token, result });
        }
        EngineCommand::Cancel { owner_id } => {
            client.request_cancel(&owner_id).await;
        }
    }
}
