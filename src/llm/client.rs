//! Async LLM client for menu matching
//!
//! Model-agnostic HTTP client for chat-completion APIs. Supports both
//! Anthropic and OpenAI-compatible APIs (DeepSeek, etc). The model only ever
//! picks menu names from a list it is given; it never decides permissions.

use crate::core::config::LlmConfig;
use crate::core::error::{MenuError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Anything that can answer a system + user prompt pair with text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// Async LLM client for making API calls
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    /// Create a new LLM client from configuration
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if !config.is_enabled() {
            return Err(MenuError::Config("llm.api_key is not set".into()));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MenuError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_format: Self::detect_api_format(&config.api_url),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            // DeepSeek, OpenAI, and other compatible APIs use OpenAI format
            ApiFormat::OpenAI
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| MenuError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MenuError::LlmError(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| MenuError::LlmError(e.to_string()))?;

        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| MenuError::LlmError("Empty response".into()))
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| MenuError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MenuError::LlmError(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| MenuError::LlmError(e.to_string()))?;

        completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| MenuError::LlmError("Empty response".into()))
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    /// Send a completion request to the LLM
    ///
    /// # Arguments
    /// * `system` - System prompt providing context and instructions
    /// * `user` - User message/query to process
    ///
    /// # Returns
    /// The LLM's text response
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        tracing::debug!(model = %self.model, format = ?self.api_format, "LLM completion request");
        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(system, user).await,
            ApiFormat::OpenAI => self.complete_openai(system, user).await,
        }
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
