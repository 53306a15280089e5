// Audio mixer for combining the call-tab and microphone streams
//
// The mixer buffers frames from each stream, pairs them up in arrival order,
// and mixes the samples together using simple addition with clipping. With
// only the tab stream present it degrades to a pass-through.

use anyhow::Result;
use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{AudioFrame, AudioStreamSource};

/// Configuration for the audio mixer
#[derive(Debug, Clone)]
pub struct MixerConfig {
    /// Target sample rate for output
    pub sample_rate: u32,
    /// Number of channels in output
    pub channels: u16,
    /// Maximum buffering delay in milliseconds.
    /// Frames older than this are dropped to prevent unbounded buffering.
    pub max_buffer_delay_ms: u64,
    /// Whether a microphone stream participates in the mix
    pub microphone_enabled: bool,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            max_buffer_delay_ms: 200,
            microphone_enabled: true,
        }
    }
}

/// Mixes tab and microphone frames into one combined stream
pub struct AudioMixer {
    config: MixerConfig,
    /// Buffers for each audio source type
    buffers: HashMap<AudioStreamSource, VecDeque<AudioFrame>>,
    current_position_ms: u64,
}

impl AudioMixer {
    pub fn new(config: MixerConfig) -> Self {
        info!(
            "Audio mixer initialized: {}Hz, {} channels, microphone={}",
            config.sample_rate, config.channels, config.microphone_enabled
        );

        let mut buffers = HashMap::new();
        buffers.insert(AudioStreamSource::Tab, VecDeque::new());
        if config.microphone_enabled {
            buffers.insert(AudioStreamSource::Microphone, VecDeque::new());
        }

        Self {
            config,
            buffers,
            current_position_ms: 0,
        }
    }

    /// Pump frames from the capture receiver into the output channel,
    /// mixing sources as they pair up. Returns when the input closes,
    /// after flushing whatever is still buffered.
    pub async fn run(
        &mut self,
        mut audio_rx: mpsc::Receiver<AudioFrame>,
        mixed_tx: mpsc::Sender<AudioFrame>,
    ) -> Result<()> {
        while let Some(frame) = audio_rx.recv().await {
            self.buffer_frame(frame);

            if let Some(mixed) = self.mix_next_chunk()? {
                if mixed_tx.send(mixed).await.is_err() {
                    debug!("Mixed-frame receiver dropped, stopping mixer");
                    return Ok(());
                }
            }
        }

        // Input closed; flush remaining buffered frames
        while let Some(mixed) = self.mix_next_chunk()? {
            if mixed_tx.send(mixed).await.is_err() {
                break;
            }
        }

        debug!("Audio mixing complete");
        Ok(())
    }

    /// Buffer a frame based on its source type
    fn buffer_frame(&mut self, frame: AudioFrame) {
        if frame.sample_rate != self.config.sample_rate {
            warn!(
                "Frame sample rate mismatch: expected {}, got {}. Dropping frame.",
                self.config.sample_rate, frame.sample_rate
            );
            return;
        }

        if frame.channels != self.config.channels {
            warn!(
                "Frame channel count mismatch: expected {}, got {}. Dropping frame.",
                self.config.channels, frame.channels
            );
            return;
        }

        if let Some(buffer) = self.buffers.get_mut(&frame.source) {
            buffer.push_back(frame);
        } else {
            debug!("Skipping frame from disabled source: {:?}", frame.source);
            return;
        }

        self.cleanup_old_frames();
    }

    /// Remove frames that are too old (beyond max buffer delay)
    fn cleanup_old_frames(&mut self) {
        let cutoff_time = self
            .current_position_ms
            .saturating_sub(self.config.max_buffer_delay_ms);

        for (source, buffer) in &mut self.buffers {
            while let Some(frame) = buffer.front() {
                if frame.timestamp_ms < cutoff_time {
                    warn!(
                        "Dropping old {:?} frame at {}ms (current position: {}ms)",
                        source, frame.timestamp_ms, self.current_position_ms
                    );
                    buffer.pop_front();
                } else {
                    break;
                }
            }
        }
    }

    /// Try to mix the next chunk of audio from the source buffers.
    ///
    /// Returns None if no buffer has data available.
    fn mix_next_chunk(&mut self) -> Result<Option<AudioFrame>> {
        let mut frames_to_mix: Vec<AudioFrame> = Vec::new();

        for (_source, buffer) in &mut self.buffers {
            if let Some(frame) = buffer.pop_front() {
                frames_to_mix.push(frame);
            }
        }

        if frames_to_mix.is_empty() {
            return Ok(None);
        }

        // Single source available: pass through unmixed (tab-only sessions)
        if frames_to_mix.len() == 1 {
            if let Some(frame) = frames_to_mix.pop() {
                self.current_position_ms = frame.timestamp_ms;
                return Ok(Some(frame));
            }
        }

        let mixed = self.mix_multiple_frames(&frames_to_mix)?;
        self.current_position_ms = mixed.timestamp_ms;
        Ok(Some(mixed))
    }

    /// Mix multiple audio frames together by adding their samples,
    /// clipping to the i16 range
    fn mix_multiple_frames(&self, frames: &[AudioFrame]) -> Result<AudioFrame> {
        if frames.is_empty() {
            anyhow::bail!("Cannot mix zero frames");
        }

        // Use the earliest timestamp
        let timestamp_ms = frames.iter().map(|f| f.timestamp_ms).min().unwrap_or(0);

        // Output length is the longest frame's length
        let max_len = frames.iter().map(|f| f.samples.len()).max().unwrap_or(0);
        let mut mixed_samples = Vec::with_capacity(max_len);

        for i in 0..max_len {
            let mut sum: i32 = 0;

            for frame in frames {
                let sample = frame.samples.get(i).copied().unwrap_or(0);
                sum += sample as i32;
            }

            let mixed = sum.clamp(i16::MIN as i32, i16::MAX as i32);
            mixed_samples.push(mixed as i16);
        }

        Ok(AudioFrame {
            samples: mixed_samples,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            timestamp_ms,
            // Mixed frames are attributed to the tab stream
            source: AudioStreamSource::Tab,
        })
    }
}
