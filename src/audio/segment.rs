// Segment boundary abstraction
//
// A transcription endpoint needs each uploaded unit to be a complete,
// independently decodable container. Reusing one encoder across intervals
// would put the container header only at the very start of the recording, so
// the encoder here is rotated at every boundary: `boundary()` finalizes the
// current interval into its own WAV byte buffer (header included) and starts
// buffering the next one. Invariant: no writer is ever reused across segments.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Cursor;
use tracing::debug;

use super::backend::AudioFrame;

/// One fixed-duration, independently decodable encoded audio unit.
///
/// Ephemeral: produced by the capture session, consumed once by the
/// transcription client, then discarded.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// Segment number within the session (0-indexed)
    pub index: usize,
    /// Complete WAV file bytes, header included
    pub data: Vec<u8>,
    /// Wall-clock time the segment's interval began
    pub started_at: DateTime<Utc>,
    /// Audio duration covered by this segment
    pub duration_ms: u64,
    /// Number of samples encoded
    pub sample_count: usize,
}

/// Buffers PCM frames for the current cadence interval and encodes each
/// interval into a self-contained WAV segment.
pub struct SegmentEncoder {
    sample_rate: u32,
    channels: u16,
    samples: Vec<i16>,
    segment_index: usize,
    segment_started_at: DateTime<Utc>,
    finished: bool,
}

impl SegmentEncoder {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            samples: Vec::new(),
            segment_index: 0,
            segment_started_at: Utc::now(),
            finished: false,
        }
    }

    /// Append a frame to the current interval's buffer.
    ///
    /// Fails once the encoder is finished; the capture loop treats that as
    /// the session being over, not as a crash.
    pub fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if self.finished {
            anyhow::bail!("Segment encoder already finished");
        }

        self.samples.extend_from_slice(&frame.samples);
        Ok(())
    }

    /// Close the current interval and open the next one.
    ///
    /// Encodes everything buffered since the previous boundary into one WAV
    /// byte buffer with its own header, clears the buffer, and advances the
    /// segment index. Both halves happen in this one call so no frame can
    /// land between "close" and "open".
    pub fn boundary(&mut self) -> Result<AudioSegment> {
        if self.finished {
            anyhow::bail!("Segment encoder already finished");
        }

        let segment = self.encode_current()?;
        self.samples.clear();
        self.segment_index += 1;
        self.segment_started_at = Utc::now();

        debug!(
            "Segment boundary: produced segment {} ({} bytes, {}ms)",
            segment.index,
            segment.data.len(),
            segment.duration_ms
        );

        Ok(segment)
    }

    /// Flush the final partial interval and retire the encoder.
    ///
    /// Returns None when nothing was buffered since the last boundary.
    pub fn finish(&mut self) -> Result<Option<AudioSegment>> {
        if self.finished {
            return Ok(None);
        }
        self.finished = true;

        if self.samples.is_empty() {
            return Ok(None);
        }

        let segment = self.encode_current()?;
        self.samples.clear();
        Ok(Some(segment))
    }

    /// Number of samples buffered for the current interval
    pub fn buffered_samples(&self) -> usize {
        self.samples.len()
    }

    fn encode_current(&self) -> Result<AudioSegment> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut data = Vec::new();
        {
            // A fresh writer per segment is what keeps every segment
            // independently decodable.
            let cursor = Cursor::new(&mut data);
            let mut writer =
                hound::WavWriter::new(cursor, spec).context("Failed to create WAV writer")?;

            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV segment")?;
            }

            writer.finalize().context("Failed to finalize WAV segment")?;
        }

        let sample_count = self.samples.len();
        let frames = sample_count as u64 / self.channels.max(1) as u64;
        let duration_ms = frames * 1000 / self.sample_rate.max(1) as u64;

        Ok(AudioSegment {
            index: self.segment_index,
            data,
            started_at: self.segment_started_at,
            duration_ms,
            sample_count,
        })
    }
}
