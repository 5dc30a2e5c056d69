//! The fixed four-stage plan executor: extract → clean → summarize → format.
//!
//! The executor holds no state across runs; separate documents can be
//! processed concurrently as long as the two external capabilities are
//! reentrant. Nothing is retried here — retry policy belongs to callers.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::backend::{CompletionBackend, InferenceError, TextExtractor};
use crate::locate::{LocatorConfig, locate_abstract};
use crate::normalize::normalize;
use crate::prompt::build_prompt;
use crate::sanitize::{SanitizeError, SanitizerConfig, sanitize};
use crate::{Document, PLAN, PlanStep, SegmentSource, StageError, StepReport, StepStatus};

/// Tunables for a pipeline run. The plan itself never varies.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub locator: LocatorConfig,
    pub sanitizer: SanitizerConfig,
    /// Token budget forwarded to the completion backend.
    pub max_tokens: u32,
    /// Wall-clock budget for the Summarize step.
    pub summarize_timeout: Duration,
    /// Segment cap applied when building the prompt.
    pub prompt_segment_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            locator: LocatorConfig::default(),
            sanitizer: SanitizerConfig::default(),
            max_tokens: 250,
            summarize_timeout: Duration::from_secs(120),
            prompt_segment_bytes: 2000,
        }
    }
}

/// Final pipeline output: the sanitized summary plus run metadata.
#[derive(Debug, Clone)]
pub struct SummaryOutput {
    pub document_id: String,
    /// Single paragraph, no control markers.
    pub summary: String,
    pub segment_source: SegmentSource,
    pub elapsed: Duration,
    pub steps: Vec<StepReport>,
}

/// A failed run, attributed to the step that caused it.
///
/// No partial summary is ever surfaced as if it were complete; the failing
/// stage and kind are always named.
#[derive(Error, Debug)]
#[error("{step} failed: {error}")]
pub struct PipelineFailure {
    pub step: PlanStep,
    pub error: StageError,
    /// Status of every step in the plan, including the skipped tail.
    pub steps: Vec<StepReport>,
}

pub struct Pipeline<'a> {
    extractor: &'a dyn TextExtractor,
    completion: &'a dyn CompletionBackend,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        extractor: &'a dyn TextExtractor,
        completion: &'a dyn CompletionBackend,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor,
            completion,
            config,
        }
    }

    /// Run the full plan for one document.
    ///
    /// The first failing step halts the run. Cancellation is honored before
    /// and during the Summarize step, the single long-latency operation.
    pub async fn run(
        &self,
        document_id: &str,
        pdf_bytes: &[u8],
        cancel: &CancellationToken,
    ) -> Result<SummaryOutput, PipelineFailure> {
        let run_start = Instant::now();
        let mut trace = StepTrace::default();

        // Step 1: extract text from the PDF bytes.
        let started = Instant::now();
        let raw_text = match self.extractor.extract(pdf_bytes) {
            Ok(text) => text,
            Err(e) => return Err(trace.fail(PlanStep::ExtractText, e.into(), started)),
        };
        trace.ok(PlanStep::ExtractText, started);
        let document = Document {
            id: document_id.to_string(),
            text: raw_text,
        };
        tracing::debug!(id = %document.id, bytes = document.text.len(), "extracted document text");

        // Step 2: normalize and locate the abstract. Never fails; a fallback
        // segment means degraded quality, which downstream must accept — a
        // summary of the cover page beats no summary.
        let started = Instant::now();
        let text = normalize(&document.text);
        let segment = locate_abstract(&text, &self.config.locator);
        if segment.source == SegmentSource::Fallback {
            tracing::warn!(
                id = %document.id,
                window = segment.len(),
                "no abstract markers found, using document prefix"
            );
        } else {
            tracing::debug!(id = %document.id, start = segment.start, end = segment.end, "located abstract segment");
        }
        trace.ok(PlanStep::CleanText, started);

        // Step 3: the external completion call, under timeout + cancellation.
        let started = Instant::now();
        if cancel.is_cancelled() {
            return Err(trace.fail(PlanStep::Summarize, StageError::Cancelled, started));
        }
        let prompt = build_prompt(segment.text(&text), self.config.prompt_segment_bytes);
        let timeout = self.config.summarize_timeout;
        let raw_summary = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(trace.fail(PlanStep::Summarize, StageError::Cancelled, started));
            }
            outcome = tokio::time::timeout(
                timeout,
                self.completion.complete(&prompt, self.config.max_tokens),
            ) => match outcome {
                Err(_) => {
                    return Err(trace.fail(
                        PlanStep::Summarize,
                        InferenceError::Timeout(timeout).into(),
                        started,
                    ));
                }
                Ok(Err(e)) => return Err(trace.fail(PlanStep::Summarize, e.into(), started)),
                Ok(Ok(raw)) => raw,
            },
        };
        trace.ok(PlanStep::Summarize, started);
        tracing::debug!(id = %document.id, bytes = raw_summary.len(), backend = self.completion.name(), "received raw summary");

        // Step 4: sanitize the raw model output.
        let started = Instant::now();
        let summary = match sanitize(&raw_summary, &self.config.sanitizer) {
            Ok(summary) => summary,
            Err(SanitizeError::EmptySummary) => {
                return Err(trace.fail(PlanStep::FormatOutput, StageError::EmptySummary, started));
            }
        };
        trace.ok(PlanStep::FormatOutput, started);

        Ok(SummaryOutput {
            document_id: document.id,
            summary,
            segment_source: segment.source,
            elapsed: run_start.elapsed(),
            steps: trace.reports,
        })
    }
}

/// Accumulates per-step reports as the plan advances.
#[derive(Default)]
struct StepTrace {
    reports: Vec<StepReport>,
}

impl StepTrace {
    fn ok(&mut self, step: PlanStep, started: Instant) {
        self.reports.push(StepReport {
            step,
            status: StepStatus::Ok,
            elapsed: Some(started.elapsed()),
        });
    }

    /// Record the failing step, mark the rest of the plan skipped, and
    /// build the failure.
    fn fail(mut self, step: PlanStep, error: StageError, started: Instant) -> PipelineFailure {
        self.reports.push(StepReport {
            step,
            status: StepStatus::Failed,
            elapsed: Some(started.elapsed()),
        });
        for &skipped in PLAN.iter().skip_while(|s| **s != step).skip(1) {
            self.reports.push(StepReport {
                step: skipped,
                status: StepStatus::Skipped,
                elapsed: None,
            });
        }
        PipelineFailure {
            step,
            error,
            steps: self.reports,
        }
    }
}
