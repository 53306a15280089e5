use anyhow::{Context, Result};
use serde_json::json;
use std::time::Duration;
use tracing::info;

use super::templates::template_by_id;
use crate::config::{AnalysisConfig, Settings, SummaryProvider};
use crate::transcript::TranscriptLog;

/// Generates an LLM analysis of a transcript through one of two
/// interchangeable providers
pub struct AnalysisRequestor {
    http: reqwest::Client,
    config: AnalysisConfig,
}

impl AnalysisRequestor {
    pub fn new(config: AnalysisConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self { http, config }
    }

    /// Send the selected template's instructions plus the full transcript to
    /// the configured provider.
    ///
    /// Errors explicitly (unlike the transcription pipeline, which fails
    /// silently): an empty transcript, a missing API key, and a non-success
    /// response all surface to the caller.
    pub async fn analyze(
        &self,
        transcript: &str,
        settings: &Settings,
        template_id: &str,
    ) -> Result<String> {
        if transcript.trim().is_empty() {
            anyhow::bail!("Transcript is empty; nothing to analyze");
        }

        if settings.api_key.trim().is_empty() {
            anyhow::bail!("No API key configured");
        }

        let template = template_by_id(template_id);
        info!(
            "Requesting '{}' analysis via {:?}",
            template.name, settings.summary_provider
        );

        match settings.summary_provider {
            SummaryProvider::OpenAi => {
                self.analyze_openai(transcript, &settings.api_key, template.prompt)
                    .await
            }
            SummaryProvider::Claude => {
                self.analyze_claude(transcript, &settings.api_key, template.prompt)
                    .await
            }
        }
    }

    async fn analyze_openai(
        &self,
        transcript: &str,
        api_key: &str,
        instructions: &str,
    ) -> Result<String> {
        let body = json!({
            "model": self.config.openai_model,
            "max_tokens": self.config.max_tokens,
            "messages": [
                { "role": "system", "content": instructions },
                { "role": "user", "content": transcript },
            ],
        });

        let response = self
            .http
            .post(&self.config.openai_endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("Analysis request failed")?;

        let status = response.status();
        let json: serde_json::Value = response
            .json()
            .await
            .context("Analysis response was not valid JSON")?;

        if !status.is_success() {
            anyhow::bail!("{}", provider_error(&json, status.as_u16()));
        }

        json.pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .context("Analysis response carried no text")
    }

    async fn analyze_claude(
        &self,
        transcript: &str,
        api_key: &str,
        instructions: &str,
    ) -> Result<String> {
        let body = json!({
            "model": self.config.claude_model,
            "max_tokens": self.config.max_tokens,
            "system": instructions,
            "messages": [
                { "role": "user", "content": transcript },
            ],
        });

        let response = self
            .http
            .post(&self.config.claude_endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .context("Analysis request failed")?;

        let status = response.status();
        let json: serde_json::Value = response
            .json()
            .await
            .context("Analysis response was not valid JSON")?;

        if !status.is_success() {
            anyhow::bail!("{}", provider_error(&json, status.as_u16()));
        }

        json.pointer("/content/0/text")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .context("Analysis response carried no text")
    }
}

/// Prefer the provider's own error message; fall back to a status-coded one
fn provider_error(body: &serde_json::Value, status: u16) -> String {
    body.pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(|msg| format!("Analysis provider error: {}", msg))
        .unwrap_or_else(|| format!("Analysis endpoint returned status {}", status))
}

/// Non-AI fallback summary computed entirely from the persisted transcript.
///
/// Used when no API key is configured. Never fails, never touches the
/// network, and always returns a non-empty string containing the entry count.
pub fn local_summary(log: &TranscriptLog) -> String {
    if log.is_empty() {
        return "Transcript is empty: 0 entries recorded.".to_string();
    }

    let mut summary = format!(
        "Local summary (no API key configured)\n\
         Entries: {}\n\
         Approximate words: {}\n",
        log.entry_count(),
        log.word_count()
    );

    if let Some((first, last)) = log.time_range() {
        summary.push_str(&format!("Time range: {} - {}\n", first, last));
    }

    summary.push_str(&format!("Preview: {}", log.preview(3)));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_summary_contains_entry_count() {
        let mut log = TranscriptLog::new();
        log.append("We agreed to ship on Friday");
        log.append("Sam owns the rollout checklist");

        let summary = local_summary(&log);
        assert!(summary.contains('2'));
        assert!(summary.contains("ship on Friday"));
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_local_summary_of_empty_log() {
        let summary = local_summary(&TranscriptLog::new());
        assert!(summary.contains('0'));
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_provider_error_prefers_message() {
        let body = serde_json::json!({ "error": { "message": "rate limited" } });
        assert!(provider_error(&body, 429).contains("rate limited"));

        let empty = serde_json::json!({});
        assert!(provider_error(&empty, 500).contains("500"));
    }
}
