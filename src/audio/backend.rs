use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Audio stream source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioStreamSource {
    /// Call-tab audio (what the other participants say)
    Tab,
    /// Microphone input (the local user's voice)
    Microphone,
}

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
    /// Which stream produced this frame
    pub source: AudioStreamSource,
}

/// Configuration for audio backends
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate
    pub sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

/// Audio capture backend trait
///
/// The actual tab/microphone capture lives with the host platform; the
/// capture session only ever sees this seam. A backend owns its stream for
/// the session's duration and must keep local playback audible (capturing
/// never mutes the call).
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames. The
    /// channel closing signals that the underlying stream ended.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio and release the stream
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Factory closure the coordinator uses to acquire capture streams.
///
/// The host integration supplies real tab/microphone backends; tests and the
/// reference wiring supply [`SilenceBackend`]s. Returning an error for
/// [`AudioStreamSource::Microphone`] degrades the session to tab-only;
/// an error for [`AudioStreamSource::Tab`] fails the session start.
pub type BackendFactory =
    Box<dyn Fn(AudioStreamSource) -> Result<Box<dyn AudioBackend>> + Send + Sync>;

/// Reference backend that synthesizes silent frames on the configured buffer
/// cadence. Used by the default wiring and by tests that need a live frame
/// source without host-platform capture.
pub struct SilenceBackend {
    config: AudioBackendConfig,
    source: AudioStreamSource,
    capturing: bool,
    task: Option<JoinHandle<()>>,
}

impl SilenceBackend {
    pub fn new(source: AudioStreamSource, config: AudioBackendConfig) -> Self {
        Self {
            config,
            source,
            capturing: false,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for SilenceBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (tx, rx) = mpsc::channel(64);

        let config = self.config.clone();
        let source = self.source;
        let samples_per_frame =
            (config.sample_rate as u64 * config.buffer_duration_ms / 1000) as usize
                * config.channels as usize;

        let task = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_millis(config.buffer_duration_ms));
            let mut elapsed_ms = 0u64;

            loop {
                interval.tick().await;

                let frame = AudioFrame {
                    samples: vec![0i16; samples_per_frame],
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                    timestamp_ms: elapsed_ms,
                    source,
                };

                if tx.send(frame).await.is_err() {
                    break; // receiver gone, stream is over
                }

                elapsed_ms += config.buffer_duration_ms;
            }
        });

        self.task = Some(task);
        self.capturing = true;

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        match self.source {
            AudioStreamSource::Tab => "silence-tab",
            AudioStreamSource::Microphone => "silence-microphone",
        }
    }
}
