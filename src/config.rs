use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Segment cadence in milliseconds (each segment covers one interval)
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
    /// Grace period after stop so the final segment dispatch gets underway
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cadence_ms: default_cadence_ms(),
            stop_grace_ms: default_stop_grace_ms(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    /// Full endpoint URL, e.g. https://api.openai.com/v1/audio/transcriptions
    #[serde(default = "default_transcription_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_transcription_endpoint(),
            model: default_transcription_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_openai_endpoint")]
    pub openai_endpoint: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_claude_endpoint")]
    pub claude_endpoint: String,
    #[serde(default = "default_claude_model")]
    pub claude_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            openai_endpoint: default_openai_endpoint(),
            openai_model: default_openai_model(),
            claude_endpoint: default_claude_endpoint(),
            claude_model: default_claude_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Persisted recording state + transcript (survives restarts)
    #[serde(default = "default_state_path")]
    pub state_path: String,
    /// Directory for transcript/analysis exports
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    /// Delay between an auto-triggered stop and the transcript export,
    /// covering the final segment's transcription round trip
    #[serde(default = "default_export_delay_ms")]
    pub export_delay_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            export_dir: default_export_dir(),
            export_delay_ms: default_export_delay_ms(),
        }
    }
}

/// User-facing settings. Read by the coordinator and the analysis requestor,
/// never mutated by them. Every field has a default so a partial settings
/// block deserializes cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub summary_provider: SummaryProvider,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub auto_stop: bool,
    #[serde(default)]
    pub auto_download: bool,
    #[serde(default = "default_true")]
    pub show_indicator: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: default_language(),
            api_key: String::new(),
            summary_provider: SummaryProvider::default(),
            auto_start: false,
            auto_stop: false,
            auto_download: false,
            show_indicator: true,
        }
    }
}

/// Which LLM endpoint the analysis requestor talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryProvider {
    #[default]
    OpenAi,
    Claude,
}

fn default_cadence_ms() -> u64 {
    15_000
}

fn default_stop_grace_ms() -> u64 {
    1_000
}

fn default_sample_rate() -> u32 {
    16000 // 16kHz, what the STT endpoint expects
}

fn default_channels() -> u16 {
    1
}

fn default_transcription_endpoint() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_claude_endpoint() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_claude_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_state_path() -> String {
    "data/callscribe-state.json".to_string()
}

fn default_export_dir() -> String {
    "exports".to_string()
}

fn default_export_delay_ms() -> u64 {
    2_000
}

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
