use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// `transcript-YYYYMMDD-HHMMSS.txt`
pub fn transcript_filename(at: DateTime<Local>) -> String {
    format!("transcript-{}.txt", at.format("%Y%m%d-%H%M%S"))
}

/// `analysis-YYYYMMDD-HHMMSS-<topic>-<template>.txt`
///
/// The topic comes from the analysis text itself when it carries a
/// `Topic: ...` line; otherwise a generic placeholder.
pub fn analysis_filename(at: DateTime<Local>, analysis_text: &str, template_name: &str) -> String {
    let topic = extract_topic(analysis_text).unwrap_or_else(|| "meeting".to_string());
    format!(
        "analysis-{}-{}-{}.txt",
        at.format("%Y%m%d-%H%M%S"),
        sanitize(&topic),
        sanitize(template_name)
    )
}

/// Find a `Topic: ...` line in generated analysis text
pub fn extract_topic(text: &str) -> Option<String> {
    for line in text.lines() {
        let trimmed = line.trim().trim_start_matches(['#', '*', '-']).trim();
        if let Some(rest) = strip_prefix_ignore_case(trimmed, "topic:") {
            let topic = rest.trim().trim_matches('*').trim();
            if !topic.is_empty() {
                return Some(topic.to_string());
            }
        }
    }
    None
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() < prefix.len() {
        return None;
    }

    // Compare on bytes: slicing the str could land inside a multi-byte
    // character. A match means the head was pure ASCII, so the split below
    // is on a char boundary.
    if text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes()) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

/// Reduce to a filename-safe `[a-z0-9-]` slug, capped for sanity
fn sanitize(text: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;

    for c in text.chars().take(60) {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "meeting".to_string()
    } else {
        slug
    }
}

/// Write the rendered transcript to the export directory
pub async fn write_transcript(export_dir: &Path, transcript: &str) -> Result<PathBuf> {
    write_file(export_dir, transcript_filename(Local::now()), transcript).await
}

/// Write generated analysis text to the export directory
pub async fn write_analysis(
    export_dir: &Path,
    analysis_text: &str,
    template_name: &str,
) -> Result<PathBuf> {
    let name = analysis_filename(Local::now(), analysis_text, template_name);
    write_file(export_dir, name, analysis_text).await
}

async fn write_file(export_dir: &Path, name: String, contents: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(export_dir)
        .await
        .with_context(|| format!("Failed to create export dir {:?}", export_dir))?;

    let path = export_dir.join(name);
    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("Failed to write export file {:?}", path))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transcript_filename_is_deterministic() {
        let at = Local.with_ymd_and_hms(2026, 8, 25, 14, 30, 5).unwrap();
        assert_eq!(transcript_filename(at), "transcript-20260825-143005.txt");
    }

    #[test]
    fn test_extract_topic() {
        let text = "## Meeting Analysis\nTopic: Q3 Budget Review\nAttendees: 4";
        assert_eq!(extract_topic(text), Some("Q3 Budget Review".to_string()));

        assert_eq!(extract_topic("no topic line here"), None);
        assert_eq!(extract_topic("**Topic:** Launch plan"), Some("Launch plan".to_string()));
    }

    #[test]
    fn test_extract_topic_handles_multibyte_lines() {
        // Lines whose sixth byte falls inside a multi-byte character must be
        // skipped, not panic the slice
        let text = "resumé of the call\nTopic: Planning";
        assert_eq!(extract_topic(text), Some("Planning".to_string()));

        assert_eq!(extract_topic("résumé only"), None);
        assert_eq!(extract_topic("Topic: Présentation"), Some("Présentation".to_string()));
    }

    #[test]
    fn test_analysis_filename_sanitizes_topic() {
        let at = Local.with_ymd_and_hms(2026, 8, 25, 14, 30, 5).unwrap();
        let name = analysis_filename(at, "Topic: Q3 Budget / Review!", "Action Items");
        assert_eq!(name, "analysis-20260825-143005-q3-budget-review-action-items.txt");
    }

    #[test]
    fn test_sanitize_falls_back_on_empty() {
        let at = Local.with_ymd_and_hms(2026, 8, 25, 0, 0, 0).unwrap();
        let name = analysis_filename(at, "!!!", "???");
        assert_eq!(name, "analysis-20260825-000000-meeting-meeting.txt");
    }
}
