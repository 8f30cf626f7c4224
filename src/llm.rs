//! Language-model client and the language-model answer source.
//!
//! [`LanguageModel`] is the seam the router talks to; [`OllamaChat`] is the
//! production implementation backed by Ollama's `/api/chat` endpoint.
//! [`LanguageModelSource`] wraps any model and never fails outwardly: a
//! failed completion becomes [`Completion::Degraded`] carrying the error
//! text, so the routing chain always terminates with an answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::models::{Answer, AnswerSource, Completion};

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("model returned an empty reply")]
    Empty,
}

/// A conversational completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier sent with each request (e.g. `"llama3"`).
    fn model_name(&self) -> &str;

    /// Sends `prompt` as a single user message and returns the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

// ============ Ollama ============

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Chat completions against a local Ollama server.
pub struct OllamaChat {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaChat {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Decode(e.to_string()))?;

        if reply.message.content.trim().is_empty() {
            return Err(CompletionError::Empty);
        }
        Ok(reply.message.content)
    }
}

// ============ Answer source ============

/// Builds the model prompt, framing `context` when one is given.
pub fn build_prompt(query: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!(
            "Answer the question using this PDF context:\n{}\n\nQ: {}",
            context, query
        ),
        None => query.to_string(),
    }
}

/// The guaranteed-answer fallback source.
#[derive(Clone)]
pub struct LanguageModelSource {
    model: Arc<dyn LanguageModel>,
}

impl LanguageModelSource {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Runs a completion, folding any failure into [`Completion::Degraded`].
    pub async fn complete(&self, query: &str, context: Option<&str>) -> Completion {
        let prompt = build_prompt(query, context);
        match self.model.complete(&prompt).await {
            Ok(content) => Completion::Ok(content),
            Err(e) => {
                tracing::warn!(model = self.model.model_name(), error = %e, "completion failed");
                Completion::Degraded(e.to_string())
            }
        }
    }

    pub async fn attempt(&self, query: &str, context: Option<&str>) -> Answer {
        Answer::new(AnswerSource::LanguageModel, self.complete(query, context).await)
    }
}
