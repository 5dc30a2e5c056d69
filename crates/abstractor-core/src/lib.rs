use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod llm;
pub mod locate;
pub mod mock;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod sanitize;

// Re-export for convenience
pub use backend::{CompletionBackend, ExtractionError, InferenceError, TextExtractor};
pub use locate::{LocatorConfig, locate_abstract};
pub use normalize::normalize;
pub use pipeline::{Pipeline, PipelineConfig, PipelineFailure, SummaryOutput};
pub use sanitize::{SanitizeError, SanitizerConfig, sanitize};

/// A document under summarization: an opaque identifier plus the raw text
/// pulled out of the PDF. Immutable once built; discarded when the run ends.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub text: String,
}

/// How the abstract segment was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSource {
    /// Bounded by start/end markers found in the text.
    MarkerMatched,
    /// No usable markers; a fixed-size prefix of the document was used.
    Fallback,
}

impl fmt::Display for SegmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentSource::MarkerMatched => write!(f, "marker-matched"),
            SegmentSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A contiguous span of a document's normalized text identified as the
/// abstract. Byte offsets into the normalized text, with
/// `start <= end <= text.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub source: SegmentSource,
}

impl Segment {
    /// The slice of `text` this segment covers.
    pub fn text<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One stage of the summarization plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStep {
    ExtractText,
    CleanText,
    Summarize,
    FormatOutput,
}

/// The plan never varies by input: the same four steps, in the same order,
/// for every document. Its explicit representation exists so each step's
/// outcome can be recorded independently, not to support dynamic planning.
pub const PLAN: [PlanStep; 4] = [
    PlanStep::ExtractText,
    PlanStep::CleanText,
    PlanStep::Summarize,
    PlanStep::FormatOutput,
];

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStep::ExtractText => write!(f, "extract-text"),
            PlanStep::CleanText => write!(f, "clean-text"),
            PlanStep::Summarize => write!(f, "summarize"),
            PlanStep::FormatOutput => write!(f, "format-output"),
        }
    }
}

/// Outcome of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Ok,
    Failed,
    /// Not reached because an earlier step failed.
    Skipped,
}

/// Per-step record, kept for failure attribution and diagnostics.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: PlanStep,
    pub status: StepStatus,
    pub elapsed: Option<Duration>,
}

/// Cause of a failed plan step.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("sanitizer produced no usable summary")]
    EmptySummary,
    #[error("run cancelled")]
    Cancelled,
}
