use serde::Serialize;

/// A canned analysis instruction. Selecting one determines the instruction
/// text prefixed to the transcript before it goes to the LLM endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

/// Static, read-only template catalog
pub const TEMPLATES: &[AnalysisTemplate] = &[
    AnalysisTemplate {
        id: "summary",
        name: "Meeting Summary",
        description: "Concise overview of what was discussed and concluded",
        prompt: "You are an assistant that summarizes meeting transcripts. \
                 Produce a concise summary of the following call transcript. \
                 Start with a single line 'Topic: <short topic>'. Then cover \
                 the main discussion points, conclusions, and overall tone. \
                 Ignore timestamps and obvious transcription noise.",
    },
    AnalysisTemplate {
        id: "action-items",
        name: "Action Items",
        description: "Every commitment, owner, and deadline mentioned",
        prompt: "Extract every action item from the following call transcript. \
                 Start with a single line 'Topic: <short topic>'. Then list \
                 each action item with its owner (if stated) and deadline (if \
                 stated) as bullet points. If there are none, say so.",
    },
    AnalysisTemplate {
        id: "decisions",
        name: "Decisions",
        description: "Decisions made and the reasoning behind them",
        prompt: "From the following call transcript, list every decision that \
                 was made. Start with a single line 'Topic: <short topic>'. \
                 For each decision, note the alternatives discussed and the \
                 stated reasoning, when the transcript contains them.",
    },
    AnalysisTemplate {
        id: "qa",
        name: "Questions & Answers",
        description: "Open questions and the answers given on the call",
        prompt: "From the following call transcript, extract the questions \
                 that were raised. Start with a single line 'Topic: <short \
                 topic>'. Pair each question with the answer given on the \
                 call, and flag the ones that were left unanswered.",
    },
];

pub const DEFAULT_TEMPLATE_ID: &str = "summary";

/// Look up a template, falling back to the default for unknown ids
pub fn template_by_id(id: &str) -> &'static AnalysisTemplate {
    TEMPLATES
        .iter()
        .find(|t| t.id == id)
        .or_else(|| TEMPLATES.iter().find(|t| t.id == DEFAULT_TEMPLATE_ID))
        .unwrap_or(&TEMPLATES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_template_lookup() {
        assert_eq!(template_by_id("action-items").name, "Action Items");
    }

    #[test]
    fn test_unknown_id_falls_back_to_default() {
        assert_eq!(template_by_id("nonsense").id, DEFAULT_TEMPLATE_ID);
    }
}
