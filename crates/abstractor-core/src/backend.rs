//! Traits for the two external capabilities the pipeline depends on.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("document is corrupted or unreadable: {0}")]
    Corrupted(String),
    #[error("document is encrypted")]
    Encrypted,
    #[error("document contains no extractable text")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),
    #[error("inference resources exhausted: {0}")]
    ResourceExhausted(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

/// Trait for PDF text extraction backends.
///
/// Implementors provide the raw byte-to-text step; everything downstream of
/// it (normalization, abstract location, sanitization) lives in this crate.
pub trait TextExtractor: Send + Sync {
    /// Extract the full text content of a PDF given its bytes.
    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// A text-completion capability that turns a prompt into generated text.
///
/// The pipeline does not assume the call is non-blocking; it only requires
/// that it resolve to a result or a typed failure. The caller-supplied
/// timeout is enforced by the pipeline, not by implementors.
pub trait CompletionBackend: Send + Sync {
    /// The canonical name of this backend (e.g., "http", "mock").
    fn name(&self) -> &str;

    /// Generate a completion for the given prompt.
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        max_tokens: u32,
    ) -> Pin<Box<dyn Future<Output = Result<String, InferenceError>> + Send + 'a>>;
}
