//! Non-streaming LLM completion against external provider APIs.
//!
//! One request, one full text answer. Upstream failures surface as
//! `Error::Llm` values and callers decide the HTTP status; there is no
//! sentinel "error occurred" text standing in for content.

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use esgdraft_core::{Error, Result};

use crate::config::LlmConfig;
use crate::types::LlmProvider;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// A single system+user completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: usize,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.3,
            max_tokens: 2048,
        }
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Reusable completion client over a shared HTTP connection pool.
#[derive(Debug, Clone, Default)]
pub struct LlmClient {
    http: Client,
}

impl LlmClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Complete a request with the provider resolved from `config`.
    pub async fn complete(&self, config: &LlmConfig, request: CompletionRequest) -> Result<String> {
        let (provider, model, api_key) = config
            .resolve_provider()
            .ok_or_else(|| Error::Config("No LLM provider configured".into()))?;

        debug!(%provider, %model, "LLM completion request");

        match provider {
            LlmProvider::OpenAI => {
                self.complete_openai_compat(OPENAI_URL, &model, &api_key, &request).await
            }
            LlmProvider::Groq => {
                self.complete_openai_compat(GROQ_URL, &model, &api_key, &request).await
            }
            LlmProvider::Anthropic => self.complete_anthropic(&model, &api_key, &request).await,
        }
    }

    /// OpenAI-compatible chat completion (OpenAI, Groq).
    async fn complete_openai_compat(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String> {
        let body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {}: {}", status, body)));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Malformed response: {}", e)))?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| Error::Llm("Response carried no message content".into()))
    }

    /// Anthropic Messages API completion.
    async fn complete_anthropic(
        &self,
        model: &str,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String> {
        let body = json!({
            "model": model,
            "system": request.system,
            "messages": [{"role": "user", "content": request.user}],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .http
            .post(ANTHROPIC_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {}: {}", status, body)));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Malformed response: {}", e)))?;

        parsed["content"][0]["text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| Error::Llm("Response carried no text block".into()))
    }
}

/// Pull the classifier's `{"index": "..."}` answer out of a model reply
/// that may wrap the JSON in prose or code fences.
pub fn extract_classifier_index(reply: &str) -> Option<String> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    let parsed: serde_json::Value = serde_json::from_str(&reply[start..=end]).ok()?;
    parsed["index"].as_str().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_index_from_plain_json() {
        let index = extract_classifier_index(r#"{ "index": "gri_standards" }"#);
        assert_eq!(index.as_deref(), Some("gri_standards"));
    }

    #[test]
    fn classifier_index_from_fenced_reply() {
        let reply = "```json\n{ \"index\": \"esg_templates\" }\n```";
        assert_eq!(extract_classifier_index(reply).as_deref(), Some("esg_templates"));
    }

    #[test]
    fn classifier_index_missing() {
        assert!(extract_classifier_index("no json here").is_none());
        assert!(extract_classifier_index(r#"{"other": 1}"#).is_none());
    }
}
