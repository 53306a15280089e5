pub mod analysis;
pub mod audio;
pub mod capture;
pub mod config;
pub mod coordinator;
pub mod export;
pub mod http;
pub mod presence;
pub mod store;
pub mod transcript;
pub mod transcription;

pub use analysis::{local_summary, AnalysisRequestor, AnalysisTemplate};
pub use audio::{
    AudioBackend, AudioBackendConfig, AudioFrame, AudioSegment, AudioStreamSource,
    BackendFactory, SegmentEncoder, SilenceBackend,
};
pub use capture::{CaptureSession, CaptureSessionConfig};
pub use config::{Config, Settings, SummaryProvider};
pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorHandle, CoordinatorNotification, RecordingState,
    RecordingStatus, TranscriptUpdate,
};
pub use http::{create_router, AppState};
pub use presence::{PageSnapshot, PresenceConfig, PresenceDetector, PresenceProbe};
pub use store::{PersistedState, StateStore};
pub use transcript::{TranscriptEntry, TranscriptLog};
pub use transcription::{
    clean_transcript, is_likely_hallucination, HttpTranscriber, SegmentTranscriber,
    TranscribeFailure,
};
