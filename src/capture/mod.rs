//! The capture-execution context: stream ownership, segment batching on a
//! fixed cadence, and per-segment transcription dispatch.

pub mod session;

pub use session::{CaptureSession, CaptureSessionConfig};
