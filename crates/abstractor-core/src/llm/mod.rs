//! Completion backends for the external summarization capability.

pub mod http;

pub use http::HttpCompletion;
