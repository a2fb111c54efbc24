//! Generative model interface and the OpenAI-compatible chat client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::chunker::estimate_tokens;
use crate::error::GenerationError;
use crate::models::GenerationConfig;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "SITEQA_API_KEY";

/// Known pricing in USD per 1K tokens.
const MODEL_PRICING: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.000_15, 0.000_6),
    ("gpt-4o", 0.005, 0.015),
    ("o3-mini", 0.000_55, 0.002_2),
    ("gemini-2.5-flash", 0.000_075, 0.000_3),
];

/// One model completion with its token accounting.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Produces grounded answers from assembled prompts.
///
/// Failures are never retried automatically; the caller decides what a
/// failed generation means for its own unit of work.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<Completion, GenerationError>;

    /// Estimated cost in USD for the given token counts.
    fn estimate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiGenerativeClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    input_rate_per_1k: f64,
    output_rate_per_1k: f64,
}

impl OpenAiGenerativeClient {
    /// Create a client from configuration.
    ///
    /// The API key falls back to the `SITEQA_API_KEY` environment variable;
    /// per-token rates fall back to the built-in pricing table (unknown
    /// models cost zero, matching a self-hosted endpoint).
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_default();

        let (table_in, table_out) = MODEL_PRICING
            .iter()
            .find(|(model, _, _)| *model == config.model)
            .map(|(_, rate_in, rate_out)| (*rate_in, *rate_out))
            .unwrap_or((0.0, 0.0));

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            input_rate_per_1k: config.input_cost_per_1k.unwrap_or(table_in),
            output_rate_per_1k: config.output_cost_per_1k.unwrap_or(table_out),
        })
    }
}

#[async_trait]
impl GenerativeModel for OpenAiGenerativeClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<Completion, GenerationError> {
        let url = format!("{}/chat/completions", self.api_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
        };

        tracing::debug!(model = %self.model, "generation request started");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::RequestError(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::RateLimited(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError(status.as_u16(), body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                GenerationError::MalformedResponse("response carries no message content".into())
            })?;

        // Fall back to the character heuristic when the endpoint omits usage.
        let (input_tokens, output_tokens) = match chat.usage {
            Some(usage) => (usage.prompt_tokens, usage.completion_tokens),
            None => (
                estimate_tokens(system) + estimate_tokens(prompt),
                estimate_tokens(&text),
            ),
        };

        tracing::debug!(
            input_tokens,
            output_tokens,
            chars = text.len(),
            "generation response received"
        );

        Ok(Completion {
            text,
            input_tokens,
            output_tokens,
        })
    }

    fn estimate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_rate_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_rate_per_1k
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> OpenAiGenerativeClient {
        OpenAiGenerativeClient::new(&GenerationConfig {
            api_url: server.base_url(),
            model: "gpt-4o-mini".into(),
            api_key: Some("test-key".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_text_and_usage() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"message": {"content": "Grounded answer."}}],
                    "usage": {"prompt_tokens": 812, "completion_tokens": 64}
                }));
            })
            .await;

        let completion = client_for(&server)
            .generate("You answer questions.", "What is product A?")
            .await
            .unwrap();

        assert_eq!(completion.text, "Grounded answer.");
        assert_eq!(completion.input_tokens, 812);
        assert_eq!(completion.output_tokens, 64);
    }

    #[tokio::test]
    async fn test_missing_usage_falls_back_to_estimate() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"message": {"content": "Answer text goes here."}}]
                }));
            })
            .await;

        let completion = client_for(&server).generate("sys", "prompt").await.unwrap();
        assert!(completion.output_tokens > 0);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_dedicated_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("slow down");
            })
            .await;

        let result = client_for(&server).generate("sys", "prompt").await;
        assert!(matches!(result, Err(GenerationError::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500).body("boom");
            })
            .await;

        let result = client_for(&server).generate("sys", "prompt").await;
        assert!(matches!(result, Err(GenerationError::ApiError(500, _))));
    }

    #[test]
    fn test_cost_is_linear_in_both_token_counts() {
        let client = OpenAiGenerativeClient::new(&GenerationConfig {
            model: "gpt-4o-mini".into(),
            api_key: Some("k".into()),
            ..Default::default()
        })
        .unwrap();

        let base = client.estimate_cost(1000, 1000);
        assert!((base - (0.000_15 + 0.000_6)).abs() < 1e-12);
        assert!((client.estimate_cost(2000, 1000) - base - 0.000_15).abs() < 1e-12);
        assert!((client.estimate_cost(1000, 2000) - base - 0.000_6).abs() < 1e-12);
        // Monotonic non-decreasing in each argument.
        assert!(client.estimate_cost(1001, 1000) >= base);
        assert!(client.estimate_cost(1000, 1001) >= base);
    }

    #[test]
    fn test_config_rates_override_pricing_table() {
        let client = OpenAiGenerativeClient::new(&GenerationConfig {
            model: "gpt-4o-mini".into(),
            api_key: Some("k".into()),
            input_cost_per_1k: Some(0.001),
            output_cost_per_1k: Some(0.002),
            ..Default::default()
        })
        .unwrap();

        assert!((client.estimate_cost(1000, 1000) - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_model_costs_zero() {
        let client = OpenAiGenerativeClient::new(&GenerationConfig {
            model: "local-llama".into(),
            api_key: Some("k".into()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.estimate_cost(10_000, 10_000), 0.0);
    }
}
