use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of the process-wide recording coordinator.
///
/// `Starting` and `Recording` double as the lock that keeps capture sessions
/// mutually exclusive: a start request is only accepted in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Starting,
    Recording,
    Stopping,
}

/// Persisted singleton describing whether a recording is active.
///
/// Mutated only by the coordinator. Invariant: `is_recording` implies both
/// `started_at` and `tab_id` are present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordingState {
    pub is_recording: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub tab_id: Option<u64>,
}

impl RecordingState {
    pub fn recording(tab_id: u64) -> Self {
        Self {
            is_recording: true,
            started_at: Some(Utc::now()),
            tab_id: Some(tab_id),
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }
}

/// Snapshot returned for status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingStatus {
    pub is_recording: bool,
    pub tab_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_state_invariant() {
        let state = RecordingState::recording(7);
        assert!(state.is_recording);
        assert!(state.started_at.is_some());
        assert_eq!(state.tab_id, Some(7));

        let idle = RecordingState::idle();
        assert!(!idle.is_recording);
        assert!(idle.started_at.is_none());
        assert!(idle.tab_id.is_none());
    }
}
