use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::hallucination::clean_transcript;
use crate::audio::AudioSegment;

/// Segments smaller than this are empty or near-silent containers; shipping
/// them wastes a network round trip for no usable text.
pub const MIN_SEGMENT_BYTES: usize = 1000;

/// Why a segment produced no text.
///
/// Reported on the out-of-band diagnostics channel so callers can tell
/// "nothing to transcribe" from "error occurred". Neither case contributes a
/// transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscribeFailure {
    MissingApiKey,
    SegmentTooSmall { bytes: usize },
    Network(String),
    Http { status: u16 },
    EmptyResult,
    Hallucination,
}

/// Something that turns one encoded audio segment into verified text.
///
/// Implementations return `None` rather than erroring: a failed or filtered
/// segment simply contributes nothing to the transcript.
#[async_trait::async_trait]
pub trait SegmentTranscriber: Send + Sync {
    async fn transcribe(&self, segment: &AudioSegment) -> Option<String>;
}

/// Transcribes segments through a remote speech-to-text endpoint
/// (one multipart upload per segment: file + model + language hint).
pub struct HttpTranscriber {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    language: String,
    diagnostics: Option<mpsc::UnboundedSender<TranscribeFailure>>,
}

impl HttpTranscriber {
    pub fn new(endpoint: String, model: String, api_key: String, language: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            http,
            endpoint,
            model,
            api_key,
            language,
            diagnostics: None,
        }
    }

    /// Attach an out-of-band channel that receives the reason for every
    /// segment that produced no text
    pub fn with_diagnostics(mut self, tx: mpsc::UnboundedSender<TranscribeFailure>) -> Self {
        self.diagnostics = Some(tx);
        self
    }

    fn report(&self, failure: TranscribeFailure) {
        debug!("Segment not transcribed: {:?}", failure);
        if let Some(tx) = &self.diagnostics {
            let _ = tx.send(failure);
        }
    }

    async fn upload(&self, segment: &AudioSegment) -> Result<String, TranscribeFailure> {
        let file_name = format!("segment-{:03}.wav", segment.index);

        let part = reqwest::multipart::Part::bytes(segment.data.clone())
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| TranscribeFailure::Network(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", self.language.clone());

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscribeFailure::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TranscribeFailure::Http {
                status: response.status().as_u16(),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranscribeFailure::Network(e.to_string()))?;

        Ok(json
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string())
    }
}

#[async_trait::async_trait]
impl SegmentTranscriber for HttpTranscriber {
    async fn transcribe(&self, segment: &AudioSegment) -> Option<String> {
        if self.api_key.trim().is_empty() {
            self.report(TranscribeFailure::MissingApiKey);
            return None;
        }

        if segment.data.len() < MIN_SEGMENT_BYTES {
            self.report(TranscribeFailure::SegmentTooSmall {
                bytes: segment.data.len(),
            });
            return None;
        }

        let raw = match self.upload(segment).await {
            Ok(text) => text,
            Err(failure) => {
                warn!(
                    "Transcription failed for segment {}: {:?}",
                    segment.index, failure
                );
                self.report(failure);
                return None;
            }
        };

        if raw.trim().is_empty() {
            self.report(TranscribeFailure::EmptyResult);
            return None;
        }

        match clean_transcript(&raw) {
            Some(text) => Some(text),
            None => {
                self.report(TranscribeFailure::Hallucination);
                None
            }
        }
    }
}
