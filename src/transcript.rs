use chrono::{DateTime, Local, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// One confirmed piece of transcribed speech
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Wall-clock time the text was confirmed (completion time, not capture
    /// time; see the ordering note on [`TranscriptLog`])
    pub timestamp: DateTime<Local>,
    pub text: String,
}

impl TranscriptEntry {
    /// Render as the persisted line form: `[H:MM:SS AM/PM] text`
    pub fn render(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%-I:%M:%S %p"), self.text)
    }
}

/// Append-only, timestamped transcript of one call.
///
/// Entries are appended in segment completion order, which is cadence order
/// under normal conditions but may deviate when a round trip is delayed. The
/// log is "mostly chronological" by design: no sequence number travels with a
/// segment, so no reordering is attempted.
#[derive(Debug, Clone, Default)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text stamped with the current wall-clock time
    pub fn append(&mut self, text: impl Into<String>) {
        self.append_at(Local::now(), text);
    }

    pub fn append_at(&mut self, timestamp: DateTime<Local>, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            timestamp,
            text: text.into(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Approximate spoken-word count across all entries
    pub fn word_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.text.split_whitespace().count())
            .sum()
    }

    /// Formatted times of the first and last entries
    pub fn time_range(&self) -> Option<(String, String)> {
        let first = self.entries.first()?;
        let last = self.entries.last()?;
        Some((
            first.timestamp.format("%-I:%M:%S %p").to_string(),
            last.timestamp.format("%-I:%M:%S %p").to_string(),
        ))
    }

    /// The first `max_entries` entries' text, joined for display
    pub fn preview(&self, max_entries: usize) -> String {
        self.entries
            .iter()
            .take(max_entries)
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Serialize to the persisted form: newline-delimited rendered entries
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(TranscriptEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rebuild a log from its persisted form.
    ///
    /// Tolerant: lines that do not match the `[time] text` shape are kept as
    /// entries stamped at load time rather than dropped. Persisted times
    /// carry no date, so parsed timestamps land on today's date.
    pub fn parse(serialized: &str) -> Self {
        let mut log = TranscriptLog::new();

        for line in serialized.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match split_rendered_line(line) {
                Some((timestamp, text)) => {
                    log.append_at(timestamp, text);
                }
                None => {
                    log.append(line);
                }
            }
        }

        log
    }
}

fn split_rendered_line(line: &str) -> Option<(DateTime<Local>, &str)> {
    let rest = line.strip_prefix('[')?;
    let (label, text) = rest.split_once("] ")?;
    let time = NaiveTime::parse_from_str(label, "%I:%M:%S %p").ok()?;
    let timestamp = Local
        .from_local_datetime(&Local::now().date_naive().and_time(time))
        .earliest()?;
    Some((timestamp, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_line_shape() {
        let mut log = TranscriptLog::new();
        let ts = Local.with_ymd_and_hms(2026, 3, 4, 15, 4, 5).unwrap();
        log.append_at(ts, "Budget approved");

        assert_eq!(log.render(), "[3:04:05 PM] Budget approved");
    }

    #[test]
    fn test_append_is_monotonic_and_ordered() {
        let mut log = TranscriptLog::new();
        log.append("first");
        log.append("second");
        log.append("third");

        assert_eq!(log.entry_count(), 3);
        let texts: Vec<_> = log.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_render_parse_round_trip() {
        let mut log = TranscriptLog::new();
        let ts = Local.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap();
        log.append_at(ts, "Let's move the deadline to Friday");
        log.append_at(ts, "Action item for Sam");

        let parsed = TranscriptLog::parse(&log.render());
        assert_eq!(parsed.entry_count(), 2);
        assert_eq!(parsed.entries()[0].text, "Let's move the deadline to Friday");
        assert_eq!(parsed.entries()[1].text, "Action item for Sam");
    }

    #[test]
    fn test_parse_tolerates_unstructured_lines() {
        let parsed = TranscriptLog::parse("not a rendered line\n\n[9:00:00 AM] real entry");
        assert_eq!(parsed.entry_count(), 2);
        assert_eq!(parsed.entries()[1].text, "real entry");
    }

    #[test]
    fn test_word_count_and_preview() {
        let mut log = TranscriptLog::new();
        log.append("one two three");
        log.append("four five");

        assert_eq!(log.word_count(), 5);
        assert_eq!(log.preview(1), "one two three");
    }
}
