use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::{
    AudioBackend, AudioMixer, AudioSegment, MixerConfig, SegmentEncoder,
};
use crate::coordinator::TranscriptUpdate;
use crate::transcription::{clean_transcript, SegmentTranscriber};

/// Capture session tuning
#[derive(Debug, Clone)]
pub struct CaptureSessionConfig {
    /// Segment cadence: how much audio each segment covers
    pub cadence: Duration,
    /// How long to wait after stop for the final segment's dispatch to start
    pub stop_grace: Duration,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for CaptureSessionConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_millis(15_000),
            stop_grace: Duration::from_millis(1_000),
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// A live capture session: owns the audio backends, the segment encoder, and
/// the cadence timer, and dispatches every finished segment to the
/// transcription pipeline.
///
/// Exactly one session exists at a time; the coordinator's state machine is
/// the lock that enforces it.
pub struct CaptureSession {
    id: Uuid,
    stop_tx: watch::Sender<bool>,
    capture_task: Option<JoinHandle<()>>,
    /// Backends in acquisition order (tab first, then microphone); torn down
    /// in reverse
    backends: Vec<Box<dyn AudioBackend>>,
    stop_grace: Duration,
}

impl CaptureSession {
    /// Acquire streams and start capturing.
    ///
    /// The tab backend is required; the microphone backend is best-effort and
    /// its absence degrades the session to tab-only audio. Verified segment
    /// text is sent on `transcript_tx` in completion order.
    pub async fn start(
        config: CaptureSessionConfig,
        mut tab_backend: Box<dyn AudioBackend>,
        mic_backend: Option<Box<dyn AudioBackend>>,
        transcriber: Arc<dyn SegmentTranscriber>,
        transcript_tx: mpsc::Sender<TranscriptUpdate>,
    ) -> Result<Self> {
        let tab_rx = tab_backend
            .start()
            .await
            .context("Failed to start tab audio capture")?;

        let mut backends: Vec<Box<dyn AudioBackend>> = vec![tab_backend];

        let mic_rx = match mic_backend {
            Some(mut mic) => match mic.start().await {
                Ok(rx) => {
                    backends.push(mic);
                    Some(rx)
                }
                Err(e) => {
                    // Not fatal: a call can be transcribed from tab audio alone
                    warn!("Microphone capture unavailable, continuing tab-only: {}", e);
                    None
                }
            },
            None => None,
        };

        let id = Uuid::new_v4();
        info!(
            "Capture session {} starting: cadence={}ms, microphone={}",
            id,
            config.cadence.as_millis(),
            mic_rx.is_some()
        );

        // Funnel all source streams into one channel for the mixer
        let (combined_tx, combined_rx) = mpsc::channel(128);
        spawn_forwarder(tab_rx, combined_tx.clone());
        if let Some(rx) = mic_rx {
            spawn_forwarder(rx, combined_tx.clone());
        }
        drop(combined_tx); // mixer input closes when all forwarders finish

        let mixer_config = MixerConfig {
            sample_rate: config.sample_rate,
            channels: config.channels,
            microphone_enabled: true,
            ..MixerConfig::default()
        };
        let (mixed_tx, mixed_rx) = mpsc::channel(128);
        let mut mixer = AudioMixer::new(mixer_config);
        tokio::spawn(async move {
            if let Err(e) = mixer.run(combined_rx, mixed_tx).await {
                warn!("Audio mixer stopped with error: {}", e);
            }
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let stop_grace = config.stop_grace;

        let capture_task = tokio::spawn(capture_loop(
            config,
            mixed_rx,
            stop_rx,
            transcriber,
            transcript_tx,
        ));

        Ok(Self {
            id,
            stop_tx,
            capture_task: Some(capture_task),
            backends,
            stop_grace,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop the session: cancel the cadence timer, flush and dispatch the
    /// final segment, wait the grace period, then release streams in
    /// reverse-acquisition order.
    ///
    /// In-flight transcription calls are not cancelled; their text may still
    /// arrive on the transcript channel after this returns.
    pub async fn stop(mut self) -> Result<()> {
        info!("Stopping capture session {}", self.id);

        // Observed synchronously by the capture loop: no further segment
        // boundaries after this
        let _ = self.stop_tx.send(true);

        if let Some(task) = self.capture_task.take() {
            if let Err(e) = task.await {
                warn!("Capture task panicked: {}", e);
            }
        }

        // Let the final segment's dispatch get underway before tearing the
        // streams down
        tokio::time::sleep(self.stop_grace).await;

        while let Some(mut backend) = self.backends.pop() {
            if let Err(e) = backend.stop().await {
                warn!("Failed to stop backend {}: {}", backend.name(), e);
            }
        }

        info!("Capture session stopped");
        Ok(())
    }
}

/// Forward frames from a backend receiver into the combined channel
fn spawn_forwarder(
    mut rx: mpsc::Receiver<crate::audio::AudioFrame>,
    tx: mpsc::Sender<crate::audio::AudioFrame>,
) {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if tx.send(frame).await.is_err() {
                break;
            }
        }
    });
}

/// The capture-execution loop.
///
/// Frames are written into the segment encoder; every cadence tick closes the
/// current segment and opens the next one in a single arm, so no frame and no
/// second boundary can be scheduled in between. A stop signal or the frame
/// stream ending (source died) exits the loop and flushes the final partial
/// segment.
async fn capture_loop(
    config: CaptureSessionConfig,
    mut mixed_rx: mpsc::Receiver<crate::audio::AudioFrame>,
    mut stop_rx: watch::Receiver<bool>,
    transcriber: Arc<dyn SegmentTranscriber>,
    transcript_tx: mpsc::Sender<TranscriptUpdate>,
) {
    let mut encoder = SegmentEncoder::new(config.sample_rate, config.channels);

    // First boundary fires one cadence from now, not immediately
    let start = tokio::time::Instant::now() + config.cadence;
    let mut cadence = tokio::time::interval_at(start, config.cadence);
    cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            maybe_frame = mixed_rx.recv() => {
                match maybe_frame {
                    Some(frame) => {
                        if let Err(e) = encoder.write_frame(&frame) {
                            warn!("Encoder rejected frame, ending capture: {}", e);
                            break;
                        }
                    }
                    None => {
                        // Source stream ended externally; finish cleanly
                        debug!("Frame stream closed, ending capture loop");
                        break;
                    }
                }
            }
            _ = cadence.tick() => {
                match encoder.boundary() {
                    Ok(segment) => {
                        dispatch_segment(segment, false, &transcriber, &transcript_tx);
                    }
                    Err(e) => {
                        warn!("Segment boundary failed, ending capture: {}", e);
                        break;
                    }
                }
            }
            changed = stop_rx.changed() => {
                // Err means the sender is gone (session dropped without
                // stop); either way the session is over
                if changed.is_err() || *stop_rx.borrow() {
                    debug!("Stop observed, ending capture loop");
                    break;
                }
            }
        }
    }

    // Final flush: whatever accumulated since the last boundary
    match encoder.finish() {
        Ok(Some(segment)) => {
            dispatch_segment(segment, true, &transcriber, &transcript_tx);
        }
        Ok(None) => {}
        Err(e) => warn!("Final segment flush failed: {}", e),
    }
}

/// Hand one finished segment to the transcription pipeline.
///
/// Each dispatch is an independent task: network round trips for different
/// segments may complete out of order, and text is forwarded in completion
/// order (no reordering, no sequence numbers).
fn dispatch_segment(
    segment: AudioSegment,
    is_final: bool,
    transcriber: &Arc<dyn SegmentTranscriber>,
    transcript_tx: &mpsc::Sender<TranscriptUpdate>,
) {
    let transcriber = Arc::clone(transcriber);
    let transcript_tx = transcript_tx.clone();

    tokio::spawn(async move {
        let index = segment.index;
        let Some(raw) = transcriber.transcribe(&segment).await else {
            debug!("Segment {} produced no text", index);
            return;
        };

        // The same hallucination gate the HTTP client applies; transcriber
        // implementations are not trusted to have run it
        let Some(text) = clean_transcript(&raw) else {
            debug!("Segment {} text filtered as hallucination", index);
            return;
        };

        let update = TranscriptUpdate {
            text,
            is_final,
            timestamp: Utc::now(),
        };

        if transcript_tx.send(update).await.is_err() {
            debug!("Transcript receiver gone, dropping segment {} text", index);
        }
    });
}
