//! Segment transcription: hallucination filtering plus the HTTP client that
//! ships encoded segments to the remote speech-to-text endpoint.

pub mod client;
pub mod hallucination;

pub use client::{
    HttpTranscriber, SegmentTranscriber, TranscribeFailure, MIN_SEGMENT_BYTES,
};
pub use hallucination::{clean_transcript, is_likely_hallucination};
