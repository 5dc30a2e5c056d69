use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::normalize::floor_char_boundary;

/// Default hallucination marker patterns, in detection-priority order.
///
/// These track the observed failure modes of the completion model (echoing
/// a new structured block instead of continuing prose) and are expected to
/// shift between model versions, so they are configuration data rather than
/// control flow.
static DEFAULT_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"QUESTION",
        r"Questions?:",
        r"\bQ:",
        r"References?:",
        r"Bibliography:",
        r"##",
        r"Notes?:",
        r"Introduction:",
        r"Conclusion:",
        r"Acknowledge?ments?",
        r"Appendix",
        r"(?m)^\s*(?:Figure|Table)\s+\d",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const DEFAULT_MAX_BYTES: usize = 600;
const DEFAULT_MIN_BYTES: usize = 20;
const SUMMARY_LABEL: &str = "Summary:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("summary was empty or too short after sanitization")]
    EmptySummary,
}

/// Tunables for [`sanitize`].
#[derive(Debug, Clone)]
pub struct SanitizerConfig {
    markers: Vec<Regex>,
    /// Length cap for the finished summary.
    pub max_bytes: usize,
    /// Below this, the summary is unusable and the step fails.
    pub min_bytes: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.clone(),
            max_bytes: DEFAULT_MAX_BYTES,
            min_bytes: DEFAULT_MIN_BYTES,
        }
    }
}

impl SanitizerConfig {
    /// Replace the marker list with custom patterns, in priority order.
    pub fn set_markers(&mut self, patterns: &[String]) -> Result<(), regex::Error> {
        self.markers = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<_, _>>()?;
        Ok(())
    }
}

/// Validate and trim raw model output into a single-paragraph summary.
///
/// Truncates at the first recognized hallucination marker (or a repeated
/// "Summary:" label), collapses to one paragraph, and caps the length at a
/// sentence boundary. Output that ends up shorter than the minimum is a
/// terminal condition for the step, surfaced as
/// [`SanitizeError::EmptySummary`] rather than an empty string.
///
/// On success the output contains no embedded newline and no marker
/// occurrence, and `sanitize` is idempotent.
pub fn sanitize(raw: &str, config: &SanitizerConfig) -> Result<String, SanitizeError> {
    let mut kept = raw.trim();

    // The model sometimes echoes the prompt's trailing "Summary:" label
    // before the actual summary; a leading label is not a hallucination.
    if let Some(rest) = kept.strip_prefix(SUMMARY_LABEL) {
        kept = rest.trim_start();
    }

    // Truncate at the earliest marker. Any further "Summary:" label means
    // the model started a fresh structured block.
    let mut cut = kept.len();
    for re in &config.markers {
        if let Some(m) = re.find(kept) {
            cut = cut.min(m.start());
        }
    }
    if let Some(pos) = kept.find(SUMMARY_LABEL) {
        cut = cut.min(pos);
    }
    let kept = &kept[..cut];

    // Single paragraph: no embedded newlines, single spaces.
    let mut summary = kept.split_whitespace().collect::<Vec<_>>().join(" ");

    if summary.len() > config.max_bytes {
        summary.truncate(cut_point(&summary, config.max_bytes));
        let trimmed = summary.trim_end().len();
        summary.truncate(trimmed);
    }

    if summary.len() < config.min_bytes {
        return Err(SanitizeError::EmptySummary);
    }
    Ok(summary)
}

/// Cut index for an over-cap summary: the last sentence end at or before
/// `cap`, else the last word boundary, else `cap` itself (snapped to a char
/// boundary) — never mid-word.
fn cut_point(s: &str, cap: usize) -> usize {
    let cap = floor_char_boundary(s, cap);
    let head = &s[..cap];
    if let Some(idx) = head.rfind(['.', '!', '?']) {
        return idx + 1;
    }
    if let Some(idx) = head.rfind(' ') {
        return idx;
    }
    cap
}
