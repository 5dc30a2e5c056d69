use std::future::Future;
use std::pin::Pin;

use crate::backend::{CompletionBackend, InferenceError};

/// OpenAI-compatible chat-completions backend.
///
/// Works against any server exposing the `/chat/completions` shape
/// (vLLM, llama.cpp, Ollama, hosted APIs). The pipeline enforces the
/// timeout; this backend only maps transport and HTTP failures onto the
/// typed [`InferenceError`] kinds.
pub struct HttpCompletion {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpCompletion {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }
}

impl CompletionBackend for HttpCompletion {
    fn name(&self) -> &str {
        "http"
    }

    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        max_tokens: u32,
    ) -> Pin<Box<dyn Future<Output = Result<String, InferenceError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/chat/completions", self.base_url);
            let body = serde_json::json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "max_tokens": max_tokens,
            });

            let mut request = self.client.post(&url).json(&body);
            if let Some(ref key) = self.api_key {
                request = request.bearer_auth(key);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| InferenceError::ModelUnavailable(e.to_string()))?;

            let status = resp.status();
            if status.as_u16() == 429 {
                return Err(InferenceError::ResourceExhausted("HTTP 429".into()));
            }
            if !status.is_success() {
                return Err(InferenceError::ModelUnavailable(format!("HTTP {}", status)));
            }

            let data: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| InferenceError::ModelUnavailable(e.to_string()))?;

            let content = data["choices"]
                .as_array()
                .and_then(|choices| choices.first())
                .and_then(|choice| choice["message"]["content"].as_str())
                .ok_or_else(|| {
                    InferenceError::ModelUnavailable("malformed completion response".into())
                })?;

            Ok(content.to_string())
        })
    }
}
