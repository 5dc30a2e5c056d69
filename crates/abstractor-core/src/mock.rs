//! Test doubles for the two external capabilities.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::backend::{CompletionBackend, ExtractionError, InferenceError, TextExtractor};

/// A [`TextExtractor`] that returns a canned result and counts calls.
pub struct MockExtractor {
    response: Result<String, ExtractionError>,
    call_count: AtomicUsize,
}

impl MockExtractor {
    /// Create a mock that always yields `text`.
    pub fn text(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock that always fails with `error`.
    pub fn failing(error: ExtractionError) -> Self {
        Self {
            response: Err(error),
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `extract()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl TextExtractor for MockExtractor {
    fn extract(&self, _pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// A configurable mock response for [`MockCompletion`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Simulate generated text.
    Text(String),
    /// Simulate a typed inference failure.
    Fail(InferenceError),
}

/// A hand-rolled mock implementing [`CompletionBackend`] for tests.
///
/// Supports:
/// - A fixed response (used for every call), **or**
/// - A sequence of responses (one per call, repeating the last if exhausted).
/// - Optional per-call latency.
/// - Call counting via [`call_count()`](MockCompletion::call_count).
pub struct MockCompletion {
    /// If non-empty, each call pops the next response.
    responses: Mutex<Vec<MockResponse>>,
    /// Fallback when the sequence is empty (or single-response mode).
    fallback: MockResponse,
    delay: Option<Duration>,
    call_count: AtomicUsize,
}

impl MockCompletion {
    /// Create a mock that always returns `response`.
    pub fn new(response: MockResponse) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback: response,
            delay: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock that always returns `text`.
    pub fn text(text: &str) -> Self {
        Self::new(MockResponse::Text(text.to_string()))
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(mut responses: Vec<MockResponse>) -> Self {
        assert!(
            !responses.is_empty(),
            "sequence must have at least one response"
        );
        // Reverse so we can pop() from the front cheaply.
        responses.reverse();
        let fallback = responses.first().cloned().unwrap();
        Self {
            responses: Mutex::new(responses),
            fallback,
            delay: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Set simulated inference latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `complete()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> MockResponse {
        let mut seq = self.responses.lock().unwrap();
        seq.pop().unwrap_or_else(|| self.fallback.clone())
    }
}

impl CompletionBackend for MockCompletion {
    fn name(&self) -> &str {
        "mock"
    }

    fn complete<'a>(
        &'a self,
        _prompt: &'a str,
        _max_tokens: u32,
    ) -> Pin<Box<dyn Future<Output = Result<String, InferenceError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let response = self.next_response();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }

            match response {
                MockResponse::Text(text) => Ok(text),
                MockResponse::Fail(e) => Err(e),
            }
        })
    }
}
