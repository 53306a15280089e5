// Shared fixtures for integration tests: scripted transcribers and
// silence-backed capture factories. Not every test binary uses every fixture.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use callscribe::audio::{
    AudioBackend, AudioBackendConfig, AudioSegment, BackendFactory, SilenceBackend,
};
use callscribe::capture::CaptureSessionConfig;
use callscribe::transcription::SegmentTranscriber;

/// Returns a scripted text per segment: the next queued item, then the
/// repeated default. `None` items simulate failed/filtered segments.
pub struct ScriptedTranscriber {
    queue: Mutex<VecDeque<Option<String>>>,
    default: Option<String>,
    pub calls: AtomicUsize,
}

impl ScriptedTranscriber {
    pub fn repeating(text: &str) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            default: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn sequence(items: Vec<Option<&str>>) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(items.into_iter().map(|i| i.map(String::from)).collect()),
            default: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SegmentTranscriber for ScriptedTranscriber {
    async fn transcribe(&self, _segment: &AudioSegment) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.queue.lock().expect("queue poisoned");
        match queue.pop_front() {
            Some(item) => item,
            None => self.default.clone(),
        }
    }
}

/// Capture config with a short cadence so tests cross several segment
/// boundaries quickly
pub fn fast_capture_config() -> CaptureSessionConfig {
    CaptureSessionConfig {
        cadence: Duration::from_millis(200),
        stop_grace: Duration::from_millis(50),
        sample_rate: 16000,
        channels: 1,
    }
}

/// Factory producing silence backends with short frame buffers
pub fn silence_factory() -> BackendFactory {
    Box::new(|source| {
        let config = AudioBackendConfig {
            sample_rate: 16000,
            channels: 1,
            buffer_duration_ms: 50,
        };
        Ok(Box::new(SilenceBackend::new(source, config)) as Box<dyn AudioBackend>)
    })
}

/// Factory that refuses every acquisition (permission denied)
pub fn denied_factory() -> BackendFactory {
    Box::new(|_source| anyhow::bail!("Capture permission denied"))
}

/// Factory that provides tab audio but no microphone
pub fn tab_only_factory() -> BackendFactory {
    Box::new(|source| match source {
        callscribe::audio::AudioStreamSource::Tab => {
            let config = AudioBackendConfig {
                sample_rate: 16000,
                channels: 1,
                buffer_duration_ms: 50,
            };
            Ok(Box::new(SilenceBackend::new(source, config)) as Box<dyn AudioBackend>)
        }
        callscribe::audio::AudioStreamSource::Microphone => {
            anyhow::bail!("Microphone permission denied")
        }
    })
}
