//! The coordination context: a single actor that owns the recording state
//! machine, the capture session's lifetime, and all persisted state.

mod coordinator;
mod messages;
mod state;

pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorHandle};
pub use messages::{CoordinatorNotification, CoordinatorRequest, TranscriptUpdate};
pub use state::{CoordinatorState, RecordingState, RecordingStatus};
