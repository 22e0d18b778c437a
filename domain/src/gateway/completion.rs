//! Text-completion API client.
//!
//! This module provides an HTTP client for an OpenAI-style chat-completions
//! API. Cost-tier selection (capable vs. economy model) is resolved here so
//! the pipeline stages can express retry policy without naming vendor models.

use async_trait::async_trait;
use call_ai::types::completion::{CompletionRequest, ModelTier};
use call_ai::{CompletionModel, Error};
use log::*;
use serde::{Deserialize, Serialize};

/// Chat message in the wire format of the completions API
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion API client
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    capable_model: String,
    economy_model: String,
}

impl CompletionClient {
    /// Create a new completion client with the given API key and base URL
    pub fn new(
        api_key: &str,
        base_url: &str,
        capable_model: &str,
        economy_model: &str,
    ) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();

        let mut header_value =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(
                |e| {
                    warn!("Failed to create auth header: {:?}", e);
                    Error::Configuration("Invalid API key format".to_string())
                },
            )?;
        header_value.set_sensitive(true);
        headers.insert("authorization", header_value);

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            capable_model: capable_model.to_string(),
            economy_model: economy_model.to_string(),
        })
    }

    fn model_for_tier(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Capable => &self.capable_model,
            ModelTier::Economy => &self.economy_model,
        }
    }
}

#[async_trait]
impl CompletionModel for CompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, Error> {
        let url = format!("{}/chat/completions", self.base_url);
        let model = self.model_for_tier(request.tier).to_string();

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.user,
        });

        let body = ChatRequest {
            model: model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
        };

        debug!("Requesting completion from model {model}");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Completion request failed: {:?}", e);
                if e.is_timeout() {
                    Error::Timeout(e.to_string())
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let parsed: ChatResponse = response.json().await.map_err(|e| {
                warn!("Failed to parse completion response: {:?}", e);
                Error::Deserialization(format!("Invalid completion response: {e}"))
            })?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| {
                    Error::Deserialization("Completion response contained no choices".to_string())
                })
        } else if status.as_u16() == 429 {
            let retry_after_seconds = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(30);
            Err(Error::RateLimited {
                retry_after_seconds,
            })
        } else if status.as_u16() == 401 {
            Err(Error::Authentication(
                "Completion API rejected the API key".to_string(),
            ))
        } else {
            let error_text = response.text().await.unwrap_or_default();
            error!("Completion API {status}: {error_text}");
            if status.is_server_error() {
                Err(Error::Network(format!("{status}: {error_text}")))
            } else {
                Err(Error::Provider(format!("{status}: {error_text}")))
            }
        }
    }

    fn provider_id(&self) -> &str {
        "openai_chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn complete_returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"hola"}}]}"#,
            )
            .create_async()
            .await;

        let client = CompletionClient::new("test-key", &server.url(), "capable", "cheap").unwrap();
        let result = client
            .complete(CompletionRequest::new("di hola"))
            .await
            .unwrap();

        assert_eq!(result, "hola");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn complete_selects_economy_model_for_fallback_tier() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "cheap"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#)
            .create_async()
            .await;

        let client = CompletionClient::new("test-key", &server.url(), "capable", "cheap").unwrap();
        let result = client
            .complete(CompletionRequest::new("x").with_tier(ModelTier::Economy))
            .await
            .unwrap();

        assert_eq!(result, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn complete_maps_server_errors_to_network() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = CompletionClient::new("test-key", &server.url(), "capable", "cheap").unwrap();
        let err = client
            .complete(CompletionRequest::new("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert!(err.is_retryable());
    }
}
