use crate::normalize::safe_truncate;

/// Fixed instructional template the located segment is embedded into.
const TEMPLATE_HEAD: &str = "You are an academic paper summarizer. \
Provide a concise, single-paragraph summary of the following abstract.";

/// Build the summarization prompt for a located segment.
///
/// The segment is capped at `max_segment_bytes` (on a char boundary) so an
/// oversized fallback window cannot blow the model's context.
pub fn build_prompt(segment_text: &str, max_segment_bytes: usize) -> String {
    format!(
        "{TEMPLATE_HEAD}\n\nAbstract:\n{}\n\nSummary:",
        safe_truncate(segment_text, max_segment_bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_segment() {
        let prompt = build_prompt("This paper studies X.", 2000);
        assert!(prompt.contains("Abstract:\nThis paper studies X."));
        assert!(prompt.ends_with("Summary:"));
    }

    #[test]
    fn test_prompt_caps_segment() {
        let long = "a".repeat(5000);
        let prompt = build_prompt(&long, 2000);
        assert!(prompt.contains(&"a".repeat(2000)));
        assert!(!prompt.contains(&"a".repeat(2001)));
    }
}
