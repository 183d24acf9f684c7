/// LLM Client — the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may talk to the model server directly.
/// All LLM interactions MUST go through the `LanguageModel` trait.
///
/// The backend is a locally hosted, Ollama-compatible server. Calls are never
/// retried: generation is not idempotent and a resubmission is expensive.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model '{0}' is not loaded on the model server")]
    ModelUnavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model server timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl LlmError {
    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(e)
        }
    }
}

/// A single chat message sent to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

/// One entry of the model listing. Older servers only send `name`.
#[derive(Debug, Deserialize)]
struct ModelTag {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl ModelTag {
    fn identifier(&self) -> Option<&str> {
        self.model.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ServerError {
    error: String,
}

fn server_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ServerError>(body).ok().map(|e| e.error)
}

/// Text-generation backend used by the matching pipeline.
///
/// `OllamaClient` is the production implementation; tests substitute doubles.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifiers of the models currently loaded on the server.
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;

    /// Sends one user prompt and waits for the complete response text.
    async fn chat(&self, model: &str, prompt: &str) -> Result<String, LlmError>;

    /// Fails with `ModelUnavailable` unless `model` is listed by the server.
    async fn ensure_available(&self, model: &str) -> Result<(), LlmError> {
        let models = self.list_models().await?;
        if is_model_listed(&models, model) {
            Ok(())
        } else {
            warn!("Model {model} not in server listing {models:?}");
            Err(LlmError::ModelUnavailable(model.to_string()))
        }
    }
}

/// Exact identifier match against the server listing.
pub fn is_model_listed(models: &[String], model: &str) -> bool {
    models.iter().any(|m| m == model)
}

/// reqwest-backed client for an Ollama-compatible model server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    /// `timeout` bounds every request, including the full generation round-trip.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
        })
    }

    async fn error_for_status(response: reqwest::Response) -> LlmError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = server_error_message(&body).unwrap_or(body);
        LlmError::Api { status, message }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let tags: TagsResponse = response.json().await.map_err(LlmError::from_transport)?;
        Ok(tags
            .models
            .iter()
            .filter_map(|t| t.identifier().map(String::from))
            .collect())
    }

    async fn chat(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if status.as_u16() == 404 {
            // A model unloaded after the listing check yields a JSON 404 naming it.
            // Any other 404 points at a wrong base URL or proxy path.
            let body = response.text().await.unwrap_or_default();
            return Err(match server_error_message(&body) {
                Some(message) if message.contains("model") => {
                    LlmError::ModelUnavailable(model.to_string())
                }
                message => LlmError::Api {
                    status: 404,
                    message: message.unwrap_or(body),
                },
            });
        }
        if !status.is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let chat: ChatResponse = response.json().await.map_err(LlmError::from_transport)?;

        debug!(
            "LLM call succeeded: model={model}, prompt_chars={}, response_chars={}",
            prompt.len(),
            chat.message.content.len()
        );

        Ok(chat.message.content)
    }
}
