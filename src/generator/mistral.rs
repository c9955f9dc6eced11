//! Mistral chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GeneratorConfig;
use crate::generator::error::{GeneratorError, GeneratorResult};
use crate::generator::prompt::Prompt;
use crate::generator::AnswerGenerator;

/// Answers questions through `POST {base}/v1/chat/completions`
pub struct MistralGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl MistralGenerator {
    pub fn new(config: &GeneratorConfig, api_key: &str) -> GeneratorResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries.max(1),
        })
    }

    fn request_body<'a>(&'a self, prompt: &Prompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: ChatRole::System,
                    content: prompt.system_message(),
                },
                ChatMessage {
                    role: ChatRole::User,
                    content: prompt.user_message(),
                },
            ],
        }
    }

    /// POST with retries on rate limiting and transport failures
    async fn send_chat(&self, body: &ChatRequest<'_>) -> GeneratorResult<ChatResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut last_error = GeneratorError::Unavailable;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // 1s, 4s, 9s...
                let delay = Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(delay).await;
            }

            let result = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    return response.json().await.map_err(GeneratorError::Request);
                }
                Ok(response) if response.status().as_u16() == 429 => {
                    if let Some(retry_after) = response.headers().get("Retry-After") {
                        if let Ok(secs) = retry_after.to_str().unwrap_or("5").parse::<u64>() {
                            tokio::time::sleep(Duration::from_secs(secs)).await;
                        }
                    }
                    tracing::warn!(attempt, "Language model rate limited");
                    last_error = GeneratorError::RateLimited;
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let message = response.text().await.unwrap_or_default();
                    return Err(GeneratorError::Api { status, message });
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Language model request failed");
                    last_error = if e.is_timeout() {
                        GeneratorError::Timeout
                    } else if e.is_connect() {
                        GeneratorError::Unavailable
                    } else {
                        GeneratorError::Request(e)
                    };
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl AnswerGenerator for MistralGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &Prompt) -> GeneratorResult<String> {
        let response = self.send_chat(&self.request_body(prompt)).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|answer| !answer.is_empty())
            .ok_or(GeneratorError::EmptyResponse)
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: ChatRole,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
