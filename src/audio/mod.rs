pub mod backend;
pub mod mixer;
pub mod segment;

pub use backend::{
    AudioBackend, AudioBackendConfig, AudioFrame, AudioStreamSource, BackendFactory,
    SilenceBackend,
};
pub use mixer::{AudioMixer, MixerConfig};
pub use segment::{AudioSegment, SegmentEncoder};
