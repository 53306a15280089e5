// Hallucination filter
//
// Speech models emit boilerplate on silence or noise: subtitle credits,
// "thanks for watching"-style sign-offs, bare URLs, copyright marks. A call
// recording spends a lot of time near silence, so every candidate transcript
// passes through this predicate before it can reach the transcript log.

/// Known artifact phrases, matched against the trimmed, lower-cased
/// candidate. Exact matches (trailing punctuation stripped).
/// Multi-language because the source transcript language is configurable.
const ARTIFACT_PHRASES: &[&str] = &[
    // English sign-offs and credits
    "thank you",
    "thanks for watching",
    "thank you for watching",
    "thank you so much for watching",
    "please subscribe",
    "like and subscribe",
    "see you in the next video",
    "see you next time",
    "subtitles by the amara.org community",
    "subs by www.zeoranger.co.uk",
    "transcribed by https://otter.ai",
    "you",
    "bye",
    "the end",
    // Spanish
    "gracias por ver",
    "subtítulos realizados por la comunidad de amara.org",
    // French
    "merci d'avoir regardé",
    "sous-titres réalisés para la communauté d'amara.org",
    "sous-titrage société radio-canada",
    // German
    "danke fürs zuschauen",
    "untertitel im auftrag des zdf für funk, 2017",
    "untertitelung des zdf, 2020",
    // Japanese
    "ご視聴ありがとうございました",
    "ご視聴ありがとうございました。",
    // Korean
    "시청해주셔서 감사합니다",
    "구독과 좋아요 부탁드립니다",
    // Chinese
    "謝謝觀看",
    "谢谢观看",
    "请不吝点赞 订阅 转发 打赏支持明镜与点点栏目",
];

/// Substring artifacts: credit lines that carry variable surroundings
const ARTIFACT_FRAGMENTS: &[&str] = &[
    "subtitles by",
    "subtitled by",
    "subs by",
    "transcribed by",
    "amara.org",
    "copyright ©",
    "© copyright",
    "all rights reserved",
];

/// Returns true when the candidate text looks like a speech-model artifact
/// rather than genuine transcribed speech.
///
/// Deterministic and side-effect free; locale only enters through the fixed
/// catalog above.
pub fn is_likely_hallucination(text: &str) -> bool {
    let trimmed = text.trim();

    // Too short to be real speech
    if trimmed.chars().count() < 3 {
        return true;
    }

    let normalized = trimmed.to_lowercase();

    // Short runs of one repeated character ("aaaaaa", ". . .")
    if normalized.chars().count() < 10 {
        let mut chars = normalized.chars().filter(|c| !c.is_whitespace());
        if let Some(first) = chars.next() {
            if chars.all(|c| c == first) {
                return true;
            }
        }
    }

    let stripped = normalized.trim_end_matches(['.', '!', '?', '。', '、']).trim();

    if ARTIFACT_PHRASES.contains(&stripped) {
        return true;
    }

    if ARTIFACT_FRAGMENTS.iter().any(|f| normalized.contains(f)) {
        return true;
    }

    // Bare URL or domain, nothing else
    if is_bare_url(stripped) {
        return true;
    }

    false
}

/// Trim a raw transcription result and reject hallucinations.
///
/// The single choke point shared by the HTTP transcriber and the capture
/// dispatch path: `None` means "contributes no transcript entry".
pub fn clean_transcript(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if is_likely_hallucination(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_bare_url(text: &str) -> bool {
    if text.contains(char::is_whitespace) {
        return false;
    }

    if text.starts_with("http://") || text.starts_with("https://") || text.starts_with("www.") {
        return true;
    }

    // Single token ending in a common TLD
    const TLDS: &[&str] = &[".com", ".org", ".net", ".co.uk", ".io", ".ai"];
    TLDS.iter().any(|tld| text.ends_with(tld))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_tiny() {
        assert!(is_likely_hallucination(""));
        assert!(is_likely_hallucination("   "));
        assert!(is_likely_hallucination("a"));
        assert!(is_likely_hallucination("ok"));
    }

    #[test]
    fn test_rejects_repeated_character_runs() {
        assert!(is_likely_hallucination("aaaaaa"));
        assert!(is_likely_hallucination("......"));
        assert!(is_likely_hallucination("- - -"));
    }

    #[test]
    fn test_rejects_catalog_phrases() {
        assert!(is_likely_hallucination("Thanks for watching!"));
        assert!(is_likely_hallucination("Thank you for watching."));
        assert!(is_likely_hallucination("Subtitles by the Amara.org community"));
        assert!(is_likely_hallucination("ご視聴ありがとうございました"));
        assert!(is_likely_hallucination("시청해주셔서 감사합니다"));
    }

    #[test]
    fn test_rejects_bare_urls() {
        assert!(is_likely_hallucination("www.example.com"));
        assert!(is_likely_hallucination("https://otter.ai"));
        assert!(is_likely_hallucination("example.com"));
    }

    #[test]
    fn test_accepts_ordinary_sentences() {
        assert!(!is_likely_hallucination(
            "Let's move the deadline to Friday"
        ));
        assert!(!is_likely_hallucination(
            "The budget review is scheduled for next week."
        ));
        // A URL inside a sentence is speech, not an artifact
        assert!(!is_likely_hallucination(
            "Check the docs at example.com before the call"
        ));
    }

    #[test]
    fn test_clean_transcript_trims_and_filters() {
        assert_eq!(
            clean_transcript("  We agreed on the Q3 plan.  "),
            Some("We agreed on the Q3 plan.".to_string())
        );
        assert_eq!(clean_transcript("Thanks for watching!"), None);
        assert_eq!(clean_transcript("   "), None);
    }
}
