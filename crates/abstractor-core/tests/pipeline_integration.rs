//! Integration tests for the fixed four-step pipeline.
//!
//! These tests use mock backends for both external capabilities, so no PDF
//! rendering or network access is involved.

use std::time::Duration;

use abstractor_core::mock::{MockCompletion, MockExtractor, MockResponse};
use abstractor_core::{
    ExtractionError, InferenceError, Pipeline, PipelineConfig, PlanStep, SegmentSource, StageError,
    StepStatus,
};
use tokio_util::sync::CancellationToken;

const PAPER_TEXT: &str =
    "Title Page\nAbstract\nThis paper studies X.\nKeywords: X, Y\nIntroduction...";

fn statuses(steps: &[abstractor_core::StepReport]) -> Vec<(PlanStep, StepStatus)> {
    steps.iter().map(|r| (r.step, r.status)).collect()
}

#[tokio::test]
async fn end_to_end_marker_bounded_summary() {
    let extractor = MockExtractor::text(PAPER_TEXT);
    // The capability is stubbed to echo the located segment back
    let completion = MockCompletion::text("This paper studies X.");
    let pipeline = Pipeline::new(&extractor, &completion, PipelineConfig::default());

    let output = pipeline
        .run("paper-1", b"%PDF-", &CancellationToken::new())
        .await
        .expect("pipeline should succeed");

    assert_eq!(output.summary, "This paper studies X.");
    assert_eq!(output.segment_source, SegmentSource::MarkerMatched);
    assert!(!output.summary.contains('\n'));
    assert_eq!(output.document_id, "paper-1");
    assert_eq!(
        statuses(&output.steps),
        vec![
            (PlanStep::ExtractText, StepStatus::Ok),
            (PlanStep::CleanText, StepStatus::Ok),
            (PlanStep::Summarize, StepStatus::Ok),
            (PlanStep::FormatOutput, StepStatus::Ok),
        ]
    );
    assert_eq!(extractor.call_count(), 1);
    assert_eq!(completion.call_count(), 1);
}

#[tokio::test]
async fn extraction_failure_halts_before_inference() {
    let extractor = MockExtractor::failing(ExtractionError::Corrupted("bad xref table".into()));
    let completion = MockCompletion::text("should never be produced");
    let pipeline = Pipeline::new(&extractor, &completion, PipelineConfig::default());

    let failure = pipeline
        .run("paper-2", b"%PDF-", &CancellationToken::new())
        .await
        .expect_err("pipeline should fail");

    assert_eq!(failure.step, PlanStep::ExtractText);
    assert!(matches!(
        failure.error,
        StageError::Extraction(ExtractionError::Corrupted(_))
    ));
    // No call ever reaches the summarization capability
    assert_eq!(completion.call_count(), 0);
    assert_eq!(
        statuses(&failure.steps),
        vec![
            (PlanStep::ExtractText, StepStatus::Failed),
            (PlanStep::CleanText, StepStatus::Skipped),
            (PlanStep::Summarize, StepStatus::Skipped),
            (PlanStep::FormatOutput, StepStatus::Skipped),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn inference_timeout_fails_summarize_step() {
    let extractor = MockExtractor::text(PAPER_TEXT);
    let completion =
        MockCompletion::text("too slow anyway").with_delay(Duration::from_secs(600));
    let config = PipelineConfig {
        summarize_timeout: Duration::from_secs(5),
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(&extractor, &completion, config);

    let failure = pipeline
        .run("paper-3", b"%PDF-", &CancellationToken::new())
        .await
        .expect_err("pipeline should time out");

    assert_eq!(failure.step, PlanStep::Summarize);
    assert!(matches!(
        failure.error,
        StageError::Inference(InferenceError::Timeout(_))
    ));
    assert_eq!(
        statuses(&failure.steps),
        vec![
            (PlanStep::ExtractText, StepStatus::Ok),
            (PlanStep::CleanText, StepStatus::Ok),
            (PlanStep::Summarize, StepStatus::Failed),
            (PlanStep::FormatOutput, StepStatus::Skipped),
        ]
    );
}

#[tokio::test]
async fn inference_failure_propagates_with_kind() {
    let extractor = MockExtractor::text(PAPER_TEXT);
    let completion = MockCompletion::new(MockResponse::Fail(InferenceError::ModelUnavailable(
        "connection refused".into(),
    )));
    let pipeline = Pipeline::new(&extractor, &completion, PipelineConfig::default());

    let failure = pipeline
        .run("paper-4", b"%PDF-", &CancellationToken::new())
        .await
        .expect_err("pipeline should fail");

    assert_eq!(failure.step, PlanStep::Summarize);
    assert!(matches!(
        failure.error,
        StageError::Inference(InferenceError::ModelUnavailable(_))
    ));
}

#[tokio::test]
async fn empty_summary_is_terminal() {
    let extractor = MockExtractor::text(PAPER_TEXT);
    // Model output that is nothing but a hallucinated block
    let completion = MockCompletion::text("Q: nothing");
    let pipeline = Pipeline::new(&extractor, &completion, PipelineConfig::default());

    let failure = pipeline
        .run("paper-5", b"%PDF-", &CancellationToken::new())
        .await
        .expect_err("pipeline should fail");

    assert_eq!(failure.step, PlanStep::FormatOutput);
    assert!(matches!(failure.error, StageError::EmptySummary));
}

#[tokio::test]
async fn fallback_segment_reported_in_metadata() {
    let extractor = MockExtractor::text(
        "A short technical report with no recognizable section headings at all, \
         just a single flowing body of text about the subject matter.",
    );
    let completion = MockCompletion::text("A report about some subject matter.");
    let pipeline = Pipeline::new(&extractor, &completion, PipelineConfig::default());

    let output = pipeline
        .run("paper-6", b"%PDF-", &CancellationToken::new())
        .await
        .expect("degraded location is not an error");

    assert_eq!(output.segment_source, SegmentSource::Fallback);
    assert_eq!(output.summary, "A report about some subject matter.");
}

#[tokio::test]
async fn cancellation_halts_before_inference() {
    let extractor = MockExtractor::text(PAPER_TEXT);
    let completion = MockCompletion::text("never returned");
    let pipeline = Pipeline::new(&extractor, &completion, PipelineConfig::default());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let failure = pipeline
        .run("paper-7", b"%PDF-", &cancel)
        .await
        .expect_err("cancelled run should fail");

    assert_eq!(failure.step, PlanStep::Summarize);
    assert!(matches!(failure.error, StageError::Cancelled));
    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn hallucinated_tail_is_stripped_end_to_end() {
    let extractor = MockExtractor::text(PAPER_TEXT);
    let completion = MockCompletion::text(
        "The paper investigates X and reports strong results.\nQUESTION 1: What is X?",
    );
    let pipeline = Pipeline::new(&extractor, &completion, PipelineConfig::default());

    let output = pipeline
        .run("paper-8", b"%PDF-", &CancellationToken::new())
        .await
        .expect("pipeline should succeed");

    assert_eq!(
        output.summary,
        "The paper investigates X and reports strong results."
    );
    assert!(!output.summary.contains("QUESTION"));
}

#[tokio::test]
async fn caller_level_retry_succeeds_on_second_attempt() {
    // Nothing is retried inside the pipeline; a caller re-running after a
    // transient failure gets the next backend response.
    let extractor = MockExtractor::text(PAPER_TEXT);
    let completion = MockCompletion::with_sequence(vec![
        MockResponse::Fail(InferenceError::ResourceExhausted("queue full".into())),
        MockResponse::Text("This paper studies X.".into()),
    ]);
    let pipeline = Pipeline::new(&extractor, &completion, PipelineConfig::default());

    let failure = pipeline
        .run("paper-9", b"%PDF-", &CancellationToken::new())
        .await
        .expect_err("first attempt should fail");
    assert!(matches!(
        failure.error,
        StageError::Inference(InferenceError::ResourceExhausted(_))
    ));

    let output = pipeline
        .run("paper-9", b"%PDF-", &CancellationToken::new())
        .await
        .expect("second attempt should succeed");
    assert_eq!(output.summary, "This paper studies X.");
    assert_eq!(completion.call_count(), 2);
}

#[tokio::test]
async fn runs_are_independent() {
    // A failing document must not affect a following run of the same shape.
    let completion = MockCompletion::text("This paper studies X.");

    let bad = MockExtractor::failing(ExtractionError::Encrypted);
    let pipeline = Pipeline::new(&bad, &completion, PipelineConfig::default());
    let failure = pipeline
        .run("locked", b"%PDF-", &CancellationToken::new())
        .await
        .expect_err("encrypted document should fail");
    assert_eq!(failure.step, PlanStep::ExtractText);

    let good = MockExtractor::text(PAPER_TEXT);
    let pipeline = Pipeline::new(&good, &completion, PipelineConfig::default());
    let output = pipeline
        .run("open", b"%PDF-", &CancellationToken::new())
        .await
        .expect("second run should succeed");
    assert_eq!(output.summary, "This paper studies X.");
}
