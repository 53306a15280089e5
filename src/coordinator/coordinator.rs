use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{error, info, warn};

use super::messages::{CoordinatorNotification, CoordinatorRequest, TranscriptUpdate};
use super::state::{CoordinatorState, RecordingState, RecordingStatus};
use crate::audio::{AudioStreamSource, BackendFactory};
use crate::capture::{CaptureSession, CaptureSessionConfig};
use crate::config::Settings;
use crate::export;
use crate::store::{PersistedState, StateStore};
use crate::transcript::TranscriptLog;
use crate::transcription::SegmentTranscriber;

/// Coordinator wiring
pub struct CoordinatorConfig {
    pub capture: CaptureSessionConfig,
    pub settings: Settings,
    pub state_path: PathBuf,
    pub export_dir: PathBuf,
    /// Wait after an auto-triggered stop before exporting, so the final
    /// segment's round trip can land first
    pub export_delay: Duration,
}

/// Cloneable interface to the coordinator actor.
///
/// The only way any other component starts/stops recording or reads the
/// transcript; the actor's own state stays authoritative regardless of what
/// notifications were delivered.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordinatorRequest>,
    notify_tx: broadcast::Sender<CoordinatorNotification>,
}

impl CoordinatorHandle {
    pub async fn start_recording(&self, tab_id: u64) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorRequest::StartRecording { tab_id, reply })
            .await?;
        rx.await.context("Coordinator dropped start request")?
    }

    pub async fn stop_recording(&self, auto_triggered: bool) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorRequest::StopRecording {
            auto_triggered,
            reply,
        })
        .await?;
        rx.await.context("Coordinator dropped stop request")?
    }

    pub async fn status(&self) -> Result<RecordingStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorRequest::GetStatus { reply }).await?;
        rx.await.context("Coordinator dropped status request")
    }

    pub async fn transcript(&self) -> Result<String> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorRequest::GetTranscript { reply })
            .await?;
        rx.await.context("Coordinator dropped transcript request")
    }

    pub async fn clear_transcript(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorRequest::ClearTranscript { reply })
            .await?;
        rx.await.context("Coordinator dropped clear request")
    }

    pub async fn tab_closed(&self, tab_id: u64) -> Result<()> {
        self.send(CoordinatorRequest::TabClosed { tab_id }).await
    }

    pub async fn tab_navigated(&self, tab_id: u64) -> Result<()> {
        self.send(CoordinatorRequest::TabNavigated { tab_id }).await
    }

    /// Subscribe to best-effort lifecycle notifications
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorNotification> {
        self.notify_tx.subscribe()
    }

    async fn send(&self, request: CoordinatorRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| anyhow!("Recording coordinator is not running"))
    }
}

/// The recording coordinator: single source of truth for "are we recording".
///
/// Owns the capture session's lifetime, the persisted recording state, and
/// the transcript log. Runs as one actor task; all interaction goes through
/// [`CoordinatorHandle`].
pub struct Coordinator {
    config: CoordinatorConfig,
    backend_factory: BackendFactory,
    transcriber: Arc<dyn SegmentTranscriber>,

    state: CoordinatorState,
    recording_state: RecordingState,
    log: TranscriptLog,
    session: Option<CaptureSession>,
    store: StateStore,

    /// Cloned into capture sessions; completed segment text arrives on the
    /// paired receiver in completion order
    update_tx: mpsc::Sender<TranscriptUpdate>,
    /// Own request sender, used to schedule the delayed transcript export
    self_tx: mpsc::Sender<CoordinatorRequest>,
    notify_tx: broadcast::Sender<CoordinatorNotification>,
}

impl Coordinator {
    /// Load persisted state, spawn the actor task, and hand back its handle
    pub async fn spawn(
        config: CoordinatorConfig,
        backend_factory: BackendFactory,
        transcriber: Arc<dyn SegmentTranscriber>,
    ) -> CoordinatorHandle {
        let store = StateStore::new(config.state_path.clone());
        let mut persisted = store.load().await;

        // A previous process may have died mid-recording; no session survives
        // a restart, so reconcile to idle before serving requests
        if persisted.recording_state.is_recording {
            warn!("Persisted state claims an active recording; resetting to idle");
            persisted.recording_state = RecordingState::idle();
            if let Err(e) = store.save(&persisted).await {
                warn!("Failed to persist reconciled state: {}", e);
            }
        }

        let log = TranscriptLog::parse(&persisted.transcript);
        info!(
            "Coordinator starting: {} persisted transcript entries",
            log.entry_count()
        );

        let (req_tx, req_rx) = mpsc::channel(64);
        let (update_tx, update_rx) = mpsc::channel(64);
        let (notify_tx, _) = broadcast::channel(32);

        let coordinator = Coordinator {
            config,
            backend_factory,
            transcriber,
            state: CoordinatorState::Idle,
            recording_state: persisted.recording_state,
            log,
            session: None,
            store,
            update_tx,
            self_tx: req_tx.clone(),
            notify_tx: notify_tx.clone(),
        };

        tokio::spawn(coordinator.run(req_rx, update_rx));

        CoordinatorHandle {
            tx: req_tx,
            notify_tx,
        }
    }

    async fn run(
        mut self,
        mut req_rx: mpsc::Receiver<CoordinatorRequest>,
        mut update_rx: mpsc::Receiver<TranscriptUpdate>,
    ) {
        loop {
            tokio::select! {
                request = req_rx.recv() => {
                    match request {
                        Some(request) => self.handle_request(request).await,
                        None => break,
                    }
                }
                update = update_rx.recv() => {
                    if let Some(update) = update {
                        self.handle_transcript_update(update).await;
                    }
                }
            }
        }

        info!("Coordinator shutting down");
        if let Some(session) = self.session.take() {
            if let Err(e) = session.stop().await {
                warn!("Failed to stop capture session on shutdown: {}", e);
            }
        }
    }

    async fn handle_request(&mut self, request: CoordinatorRequest) {
        match request {
            CoordinatorRequest::StartRecording { tab_id, reply } => {
                let result = self.handle_start(tab_id).await;
                let _ = reply.send(result);
            }
            CoordinatorRequest::StopRecording {
                auto_triggered,
                reply,
            } => {
                let result = self.handle_stop(auto_triggered).await;
                let _ = reply.send(result);
            }
            CoordinatorRequest::GetStatus { reply } => {
                let _ = reply.send(RecordingStatus {
                    is_recording: self.recording_state.is_recording,
                    tab_id: self.recording_state.tab_id,
                });
            }
            CoordinatorRequest::GetTranscript { reply } => {
                let _ = reply.send(self.log.render());
            }
            CoordinatorRequest::ClearTranscript { reply } => {
                self.log.clear();
                self.persist().await;
                let _ = reply.send(());
            }
            CoordinatorRequest::TabClosed { tab_id } => {
                self.handle_tab_gone("closed", tab_id).await;
            }
            CoordinatorRequest::TabNavigated { tab_id } => {
                self.handle_tab_gone("navigated away", tab_id).await;
            }
            CoordinatorRequest::ExportTranscript => {
                self.handle_export().await;
            }
        }
    }

    /// `Idle -> Starting -> Recording`, or a rejection with no side effect
    async fn handle_start(&mut self, tab_id: u64) -> Result<()> {
        if self.state != CoordinatorState::Idle {
            anyhow::bail!("Recording already in progress");
        }

        info!("Starting recording for tab {}", tab_id);
        self.state = CoordinatorState::Starting;

        match self.start_session().await {
            Ok(session) => {
                info!(
                    "Recording started for tab {} (session {})",
                    tab_id,
                    session.id()
                );
                self.session = Some(session);
                self.recording_state = RecordingState::recording(tab_id);
                self.state = CoordinatorState::Recording;
                self.persist().await;

                // Best-effort; a missed notification never rolls the state back
                let _ = self
                    .notify_tx
                    .send(CoordinatorNotification::RecordingStarted { tab_id });

                Ok(())
            }
            Err(e) => {
                // Partial acquisition is rolled back inside the session
                // start; nothing to undo here beyond the state itself
                error!("Failed to start recording: {:#}", e);
                self.state = CoordinatorState::Idle;
                Err(e)
            }
        }
    }

    async fn start_session(&mut self) -> Result<CaptureSession> {
        let tab_backend = (self.backend_factory)(AudioStreamSource::Tab)
            .context("Tab audio capture unavailable")?;

        // Microphone is best-effort: a denied permission degrades to tab-only
        let mic_backend = match (self.backend_factory)(AudioStreamSource::Microphone) {
            Ok(backend) => Some(backend),
            Err(e) => {
                warn!("Microphone unavailable: {}", e);
                None
            }
        };

        CaptureSession::start(
            self.config.capture.clone(),
            tab_backend,
            mic_backend,
            Arc::clone(&self.transcriber),
            self.update_tx.clone(),
        )
        .await
    }

    /// `Recording -> Stopping -> Idle`, or a rejection with no state change
    async fn handle_stop(&mut self, auto_triggered: bool) -> Result<()> {
        if self.state != CoordinatorState::Recording {
            anyhow::bail!("Not currently recording");
        }

        info!("Stopping recording (auto_triggered={})", auto_triggered);
        self.state = CoordinatorState::Stopping;

        if let Some(session) = self.session.take() {
            if let Err(e) = session.stop().await {
                warn!("Capture session teardown reported: {}", e);
            }
        }

        self.recording_state = RecordingState::idle();
        self.state = CoordinatorState::Idle;
        self.persist().await;

        let _ = self
            .notify_tx
            .send(CoordinatorNotification::RecordingStopped { auto_triggered });

        if auto_triggered && self.config.settings.auto_download {
            self.schedule_export();
        }

        info!("Recording stopped");
        Ok(())
    }

    async fn handle_tab_gone(&mut self, reason: &str, tab_id: u64) {
        if self.state != CoordinatorState::Recording
            || self.recording_state.tab_id != Some(tab_id)
        {
            return;
        }

        info!("Recorded tab {} {}, stopping", tab_id, reason);
        if let Err(e) = self.handle_stop(true).await {
            warn!("Auto stop after tab {} failed: {}", reason, e);
        }
    }

    /// Append completed segment text in completion order and persist.
    ///
    /// Accepted in any state: the final segment's round trip routinely lands
    /// after the coordinator has returned to idle.
    async fn handle_transcript_update(&mut self, update: TranscriptUpdate) {
        self.log.append(update.text);
        self.persist().await;

        let _ = self
            .notify_tx
            .send(CoordinatorNotification::TranscriptUpdated {
                entry_count: self.log.entry_count(),
            });
    }

    /// Queue one delayed export; the delay covers the final segment's
    /// transcription round trip landing after stop returns
    fn schedule_export(&self) {
        let tx = self.self_tx.clone();
        let delay = self.config.export_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(CoordinatorRequest::ExportTranscript).await;
        });
    }

    async fn handle_export(&self) {
        match export::write_transcript(&self.config.export_dir, &self.log.render()).await {
            Ok(path) => info!("Transcript exported to {:?}", path),
            Err(e) => error!("Transcript export failed: {}", e),
        }
    }

    async fn persist(&self) {
        let state = PersistedState {
            recording_state: self.recording_state.clone(),
            transcript: self.log.render(),
        };

        if let Err(e) = self.store.save(&state).await {
            warn!("Failed to persist state: {}", e);
        }
    }
}
