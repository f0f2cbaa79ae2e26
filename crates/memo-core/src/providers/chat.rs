//! ============================================================================
//! Chat Model - Answer generation via chat completions
//! ============================================================================
//! Sends the question plus the retrieved memos to an OpenAI-compatible
//! `/chat/completions` endpoint. The system prompt restricts the model to the
//! memos it was given.
//! ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::embeddings::api_error_message;
use super::{ChatModel, ContextDocument};
use crate::config::MemoConfig;
use crate::types::{MemoError, MemoResult};

const SERVICE: &str = "chat";

const SYSTEM_PROMPT: &str = "You answer questions about the user's calendar memos. \
Use only the memos provided below. If they do not contain the answer, say that you \
don't know instead of making one up.";

/// Chat completions client
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> MemoResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MemoError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn from_config(config: &MemoConfig) -> MemoResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| MemoError::Config("OPENAI_API_KEY is not set".to_string()))?;

        Self::new(
            api_key,
            config.base_url.clone(),
            config.chat_model.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_api(&self, request: &ChatRequest) -> MemoResult<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| MemoError::upstream(SERVICE, format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MemoError::upstream(SERVICE, format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(MemoError::upstream(SERVICE, api_error_message(status, &body)));
        }

        parse_chat_response(&body)
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn generate(&self, question: &str, context: &[ContextDocument]) -> MemoResult<String> {
        info!("Asking {} with {} memos as context", self.model, context.len());

        let request = build_request(&self.model, question, context);
        debug!("Chat prompt is {} chars", request.messages[1].content.len());

        self.call_api(&request).await
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Render retrieved memos as a context block, one per line
pub fn format_context(context: &[ContextDocument]) -> String {
    context
        .iter()
        .map(|doc| format!("- {}: {}", doc.date, doc.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_request(model: &str, question: &str, context: &[ContextDocument]) -> ChatRequest {
    let user_prompt = format!(
        "Memos:\n{}\n\nQuestion: {}",
        format_context(context),
        question.trim()
    );

    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt,
            },
        ],
        temperature: Some(0.0),
        max_tokens: None,
    }
}

fn parse_chat_response(body: &str) -> MemoResult<String> {
    let chat_response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| MemoError::upstream(SERVICE, format!("malformed response: {}", e)))?;

    chat_response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_string())
        .ok_or_else(|| MemoError::upstream(SERVICE, "no choices in response"))
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
