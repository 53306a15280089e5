use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::state::RecordingStatus;

/// Requests the coordinator accepts from other contexts.
///
/// This enum is the coordinator's entire surface: nobody else touches the
/// recording state or the transcript directly.
#[derive(Debug)]
pub enum CoordinatorRequest {
    StartRecording {
        tab_id: u64,
        reply: oneshot::Sender<Result<()>>,
    },
    StopRecording {
        auto_triggered: bool,
        reply: oneshot::Sender<Result<()>>,
    },
    GetStatus {
        reply: oneshot::Sender<RecordingStatus>,
    },
    GetTranscript {
        reply: oneshot::Sender<String>,
    },
    ClearTranscript {
        reply: oneshot::Sender<()>,
    },
    /// The recorded tab was closed; maps to an auto-triggered stop when the
    /// id matches the active recording
    TabClosed { tab_id: u64 },
    /// The recorded tab navigated away from the call site
    TabNavigated { tab_id: u64 },
    /// Internal: fires after the post-stop delay to export the transcript
    ExportTranscript,
}

/// Verified text for one transcribed segment, sent from the capture context
/// to the coordinator in completion order
#[derive(Debug, Clone)]
pub struct TranscriptUpdate {
    pub text: String,
    /// True for the session's final flushed segment
    pub is_final: bool,
    /// Completion time (when transcription finished, not when the audio was
    /// captured)
    pub timestamp: DateTime<Utc>,
}

/// Best-effort notifications broadcast to whoever listens (UI, presence
/// detector). Delivery is not guaranteed; receivers reconcile from persisted
/// state when they miss one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CoordinatorNotification {
    RecordingStarted { tab_id: u64 },
    RecordingStopped { auto_triggered: bool },
    TranscriptUpdated { entry_count: usize },
}
