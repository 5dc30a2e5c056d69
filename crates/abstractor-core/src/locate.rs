use crate::normalize::floor_char_boundary;
use crate::{Segment, SegmentSource};

/// Marker lists and window sizes for [`locate_abstract`].
///
/// Marker lists are data, not control flow: callers can extend them for
/// venue-specific section headings without touching the algorithm.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Checked case-insensitively in priority order; the first marker in
    /// the list with any occurrence wins, at its earliest position.
    pub start_markers: Vec<String>,
    /// Scanned from just after the start marker; the nearest occurrence
    /// wins regardless of list order. Matched case-sensitively so that
    /// all-caps variants ("I. INTRODUCTION") can be listed explicitly.
    pub end_markers: Vec<String>,
    /// Prefix size used when no start marker is found.
    pub fallback_window: usize,
    /// Maximum segment size past the start marker when no end marker is
    /// found.
    pub hard_cap: usize,
    /// Marker-bounded segments shorter than this are treated as noise and
    /// replaced by the fallback window.
    pub min_segment_bytes: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            start_markers: vec!["Abstract".into(), "Summary".into()],
            end_markers: vec![
                "Keywords:".into(),
                "Key words:".into(),
                "Index Terms".into(),
                "1. Introduction".into(),
                "1 Introduction".into(),
                "I. INTRODUCTION".into(),
                "Contents".into(),
                "Introduction".into(),
            ],
            fallback_window: 2000,
            hard_cap: 6000,
            min_segment_bytes: 20,
        }
    }
}

/// Locate the abstract segment in normalized document text.
///
/// Always succeeds with a best-effort segment; quality degradation is
/// signaled via [`SegmentSource::Fallback`], never an error, because
/// downstream stages must proceed regardless. Empty input yields a
/// zero-length segment at offset 0.
pub fn locate_abstract(text: &str, config: &LocatorConfig) -> Segment {
    if text.is_empty() {
        return Segment {
            start: 0,
            end: 0,
            source: SegmentSource::Fallback,
        };
    }

    let start_match = config
        .start_markers
        .iter()
        .find_map(|m| find_ascii_ci(text, m).map(|pos| (pos, pos + m.len())));

    let Some((marker_pos, content_start)) = start_match else {
        return fallback_window(text, config);
    };

    let cap_end = floor_char_boundary(text, (content_start + config.hard_cap).min(text.len()));
    let window = &text[content_start..cap_end];

    let end_rel = config.end_markers.iter().filter_map(|m| window.find(m)).min();

    let seg_end = match end_rel {
        Some(rel) => content_start + rel,
        None => {
            // An end marker ahead of the start marker with none after it is
            // malformed nesting; degrade to the fallback window rather than
            // trusting the cap.
            if config
                .end_markers
                .iter()
                .any(|m| text[..marker_pos].contains(m.as_str()))
            {
                return fallback_window(text, config);
            }
            cap_end
        }
    };

    let (start, end) = trimmed_bounds(text, content_start, seg_end);
    if end - start < config.min_segment_bytes {
        return fallback_window(text, config);
    }

    Segment {
        start,
        end,
        source: SegmentSource::MarkerMatched,
    }
}

/// Fixed-size document prefix, untrimmed so `end == min(len, window)` holds.
fn fallback_window(text: &str, config: &LocatorConfig) -> Segment {
    let end = floor_char_boundary(text, config.fallback_window.min(text.len()));
    Segment {
        start: 0,
        end,
        source: SegmentSource::Fallback,
    }
}

/// Shrink `[start, end)` past surrounding whitespace, keeping offsets into
/// the original buffer.
fn trimmed_bounds(text: &str, start: usize, end: usize) -> (usize, usize) {
    let slice = &text[start..end];
    let trimmed_start = start + (slice.len() - slice.trim_start().len());
    let trimmed = slice.trim();
    (trimmed_start, trimmed_start + trimmed.len())
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || n.len() > h.len() {
        return None;
    }
    h.windows(n.len()).position(|w| w.eq_ignore_ascii_case(n))
}
