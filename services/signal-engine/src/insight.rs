//! Insight Gateway
//!
//! HTTP client for the text-generation endpoint that produces trading
//! signals and backtest summaries. Supports a plain-text mode and a
//! structured mode that extracts JSON from a possibly fenced response body;
//! generation endpoints commonly wrap JSON in formatting decoration even
//! when asked not to.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Request timeout for generation calls (30 seconds)
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// How much of an unparsable response is echoed back in the error
const PARSE_ERROR_SNIPPET_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("insight API key is required")]
    MissingCredential,
    #[error("insight request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("insight endpoint returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse JSON response: {message}. Original response: {snippet}")]
    Parse { message: String, snippet: String },
}

/// Requested output shape for one generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Plain,
    Json,
}

/// Sampling and formatting options sent with a generation request
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    #[serde(rename = "responseFormat")]
    pub response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(rename = "topK", skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl GenerationConfig {
    pub fn plain() -> Self {
        Self {
            response_format: ResponseFormat::Plain,
            temperature: None,
            top_p: None,
            top_k: None,
        }
    }

    pub fn structured() -> Self {
        Self {
            response_format: ResponseFormat::Json,
            ..Self::plain()
        }
    }

    fn as_structured(&self) -> Self {
        Self {
            response_format: ResponseFormat::Json,
            ..self.clone()
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::plain()
    }
}

/// Source of generated text, the seam the runner depends on
#[async_trait]
pub trait InsightSource: Send + Sync {
    /// Generate free text for `prompt`. Fails with a wrapped error if the
    /// underlying call fails.
    async fn generate_text(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, InsightError>;

    /// Generate structured output: requests JSON, tolerates a fenced code
    /// block around the body, and parses the result.
    async fn generate_json(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<serde_json::Value, InsightError> {
        let structured = config.as_structured();
        let raw = self.generate_text(prompt, &structured).await?;
        parse_json_response(&raw)
    }
}

/// Client for the insight generation endpoint
#[derive(Debug)]
pub struct InsightClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    config: &'a GenerationConfig,
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

impl InsightClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, InsightError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(InsightError::MissingCredential);
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(2)
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        })
    }
}

#[async_trait]
impl InsightSource for InsightClient {
    async fn generate_text(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, InsightError> {
        let url = format!("{}/v1/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            config,
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        debug!("Insight response received ({} chars)", parsed.text.len());
        Ok(parsed.text)
    }
}

/// Extract and parse a JSON value from a raw generation response.
pub fn parse_json_response(raw: &str) -> Result<serde_json::Value, InsightError> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).map_err(|e| InsightError::Parse {
        message: e.to_string(),
        snippet: raw.chars().take(PARSE_ERROR_SNIPPET_CHARS).collect(),
    })
}

/// Strip an optional Markdown code fence from `text`.
///
/// Grammar: optional leading ``` with an optional language tag, body,
/// optional trailing ```. Text without a fence is returned trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Language tags are word characters glued to the opening fence.
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_');
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"signal":"BUY","confidence":0.82,"reasoning":"RSI oversold"}"#;

    #[test]
    fn strip_code_fence_handles_tagged_fences() {
        assert_eq!(
            strip_code_fence(&format!("```json\n{}\n```", PAYLOAD)),
            PAYLOAD
        );
        assert_eq!(strip_code_fence(&format!("```\n{}\n```", PAYLOAD)), PAYLOAD);
        assert_eq!(strip_code_fence(PAYLOAD), PAYLOAD);
    }

    #[test]
    fn strip_code_fence_tolerates_missing_trailing_fence() {
        assert_eq!(strip_code_fence(&format!("```json\n{}", PAYLOAD)), PAYLOAD);
    }

    #[test]
    fn fenced_and_unfenced_responses_parse_identically() {
        let fenced = parse_json_response(&format!("```json\n{}\n```", PAYLOAD)).unwrap();
        let plain = parse_json_response(PAYLOAD).unwrap();
        assert_eq!(fenced, plain);
        assert_eq!(fenced["signal"], "BUY");
    }

    #[test]
    fn parse_error_mentions_the_unparsable_content() {
        let err = parse_json_response("I am definitely not JSON").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("I am definitely not JSON"));
    }

    #[test]
    fn parse_error_snippet_is_bounded() {
        let long = "x".repeat(5000);
        match parse_json_response(&long).unwrap_err() {
            InsightError::Parse { snippet, .. } => {
                assert_eq!(snippet.chars().count(), PARSE_ERROR_SNIPPET_CHARS);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn generation_config_serializes_compactly() {
        let value = serde_json::to_value(GenerationConfig::structured()).unwrap();
        assert_eq!(value, serde_json::json!({ "responseFormat": "json" }));

        let mut sampled = GenerationConfig::plain();
        sampled.temperature = Some(0.4);
        let value = serde_json::to_value(&sampled).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "responseFormat": "plain", "temperature": 0.4 })
        );
    }

    #[test]
    fn client_requires_a_credential() {
        let err = InsightClient::new("http://localhost:8090", "", "test-model").unwrap_err();
        assert!(matches!(err, InsightError::MissingCredential));
    }
}
