use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use reqwest::{Client, ClientBuilder, StatusCode};
use tracing::{debug, info, warn};
use crate::content::{truncate_chars, ExtractedContent, MAX_CONTENT_CHARS};
use crate::error::{AppError, Result};

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Free-tier models tried in order, best quality first.
const FREE_MODELS: &[&str] = &[
    "mistralai/mistral-7b-instruct:free",
    "meta-llama/llama-3.1-8b-instruct:free",
    "google/gemma-2-9b-it:free",
    "meta-llama/llama-3.2-3b-instruct:free",
];

/// Pause before each fallback model, to stay inside free-tier rate limits.
const RETRY_DELAY: Duration = Duration::from_millis(1500);

const SUMMARY_MAX_TOKENS: u32 = 200;
const SUMMARY_TEMPERATURE: f32 = 0.1;

const SYSTEM_PROMPT: &str = "You are a precise summarization assistant. \
Create ultra-concise summaries using minimal sentences while capturing core information.";

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

/// Outcome of a single (model, key) attempt. Everything except `Fatal`
/// is absorbed by the fallback loop.
enum AttemptError {
    RateLimited(String),
    Unauthorized(String),
    ModelUnavailable(String),
    EmptyMessage,
    Transport(String),
    Fatal(String),
}

/// OpenRouter chat-completions client with model/key fallback.
pub struct OpenRouter {
    client: Client,
    endpoint: String,
    referer: String,
    models: Vec<String>,
    retry_delay: Duration,
}

impl OpenRouter {
    pub fn new(referer: &str) -> Self {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: OPENROUTER_API_URL.to_string(),
            referer: referer.to_string(),
            models: FREE_MODELS.iter().map(|m| m.to_string()).collect(),
            retry_delay: RETRY_DELAY,
        }
    }

    /// Points the client at a different chat-completions endpoint
    /// (self-hosted gateway, stub server in tests).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Produces a 2-3 sentence summary of `content`, walking models in
    /// list order and keys in pool order until one attempt yields a
    /// non-empty message.
    ///
    /// Keys that come back 429 or 401 are dropped for the rest of this
    /// call; nothing is remembered across calls. A 404 only burns the
    /// attempt, since the model (not the key) is what's missing. Any
    /// other non-success status fails the whole call at once.
    pub async fn summarize(
        &self,
        content: &ExtractedContent,
        url: &str,
        api_keys: &[String],
    ) -> Result<String> {
        let input = truncate_chars(&content.combined_text(), MAX_CONTENT_CHARS).to_string();
        let messages = vec![
            Message {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: format!(
                    "Summarize this web page in 2-3 sentences maximum. \
                     Be precise and capture only the most essential information.\n\n\
                     Source URL: {}\n\nContent:\n{}",
                    url, input
                ),
            },
        ];

        let mut exhausted: HashSet<usize> = HashSet::new();
        let mut last_error: Option<String> = None;

        for (model_index, model) in self.models.iter().enumerate() {
            if model_index > 0 {
                debug!(model, "trying fallback model");
                tokio::time::sleep(self.retry_delay).await;
            }

            for (key_index, api_key) in api_keys.iter().enumerate() {
                if exhausted.contains(&key_index) {
                    continue;
                }

                match self.attempt(model, &messages, api_key).await {
                    Ok(text) => {
                        info!(model, key = key_index + 1, "summary produced");
                        return Ok(text);
                    }
                    Err(AttemptError::RateLimited(msg)) => {
                        warn!(model, key = key_index + 1, "rate limited, dropping key");
                        exhausted.insert(key_index);
                        last_error = Some(msg);
                    }
                    Err(AttemptError::Unauthorized(msg)) => {
                        warn!(key = key_index + 1, "unauthorized, dropping key");
                        exhausted.insert(key_index);
                        last_error = Some(msg);
                    }
                    Err(AttemptError::ModelUnavailable(msg)) => {
                        warn!(model, "model not available");
                        last_error = Some(msg);
                    }
                    Err(AttemptError::EmptyMessage) => {
                        warn!(model, "empty completion");
                        last_error = Some("No message returned from OpenRouter".to_string());
                    }
                    Err(AttemptError::Transport(msg)) => {
                        warn!(model, error = %msg, "request failed");
                        last_error = Some(msg);
                    }
                    Err(AttemptError::Fatal(msg)) => {
                        return Err(AppError::Summarization(msg));
                    }
                }
            }
        }

        Err(AppError::ModelsExhausted(last_error.unwrap_or_else(|| {
            "no models were attempted".to_string()
        })))
    }

    async fn attempt(
        &self,
        model: &str,
        messages: &[Message],
        api_key: &str,
    ) -> std::result::Result<String, AttemptError> {
        let body = ChatRequest {
            model,
            messages,
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: SUMMARY_TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            // Recommended headers for OpenRouter
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", "Link Dashboard")
            .json(&body)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    AttemptError::RateLimited(format!("429: {}", text))
                }
                StatusCode::NOT_FOUND => {
                    AttemptError::ModelUnavailable(format!("404: {}", text))
                }
                StatusCode::UNAUTHORIZED => {
                    AttemptError::Unauthorized(format!("401: {}", text))
                }
                other => AttemptError::Fatal(format!(
                    "OpenRouter API error: {} {}",
                    other.as_u16(),
                    text
                )),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;
        let message = json["choices"][0]["message"]["content"]
            .as_str()
            .or_else(|| json["choices"][0]["text"].as_str())
            .unwrap_or("");

        if message.is_empty() {
            return Err(AttemptError::EmptyMessage);
        }
        Ok(message.to_string())
    }
}
