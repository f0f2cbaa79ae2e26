//! ============================================================================
//! Embedding Service - Vector embeddings for note retrieval
//! ============================================================================
//! Generates text embeddings through an OpenAI-compatible `/embeddings`
//! endpoint. Every failure is reported as an upstream error so the front end
//! can show it without tearing the session down.
//! ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::EmbeddingProvider;
use crate::config::MemoConfig;
use crate::types::{MemoError, MemoResult};

const SERVICE: &str = "embeddings";

/// Embedding client for OpenAI-compatible APIs
pub struct OpenAiEmbeddings {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    model: String,
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct EmbeddingUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub(crate) struct ErrorDetail {
    pub(crate) message: String,
    #[serde(rename = "type")]
    pub(crate) error_type: Option<String>,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> MemoResult<Self> {
        let client = Client::builder()
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

    /// Build from config; requires an API key
    pub fn from_config(config: &MemoConfig) -> MemoResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| MemoError::Config("OPENAI_API_KEY is not set".to_string()))?;

        Self::new(
            api_key,
            config.base_url.clone(),
            config.embedding_model.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, texts: &[String]) -> MemoResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
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

        let vectors = parse_embedding_response(&body)?;
        if vectors.len() != texts.len() {
            return Err(MemoError::upstream(
                SERVICE,
                format!("expected {} embeddings, got {}", texts.len(), vectors.len()),
            ));
        }

        Ok(vectors)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Turn a non-success response into a readable message
pub(crate) fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => format!("API error ({}): {}", status, error.error.message),
        Err(_) => format!("API error ({}): {}", status, body),
    }
}

fn parse_embedding_response(body: &str) -> MemoResult<Vec<Vec<f32>>> {
    let response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| MemoError::upstream(SERVICE, format!("malformed response: {}", e)))?;

    if let Some(usage) = &response.usage {
        debug!(
            "Embedding tokens used: {} (model: {})",
            usage.total_tokens, response.model
        );
    }

    // Sort by index and extract embeddings
    let mut embeddings: Vec<(usize, Vec<f32>)> = response
        .data
        .into_iter()
        .map(|d| (d.index, d.embedding))
        .collect();
    embeddings.sort_by_key(|(idx, _)| *idx);

    Ok(embeddings.into_iter().map(|(_, e)| e).collect())
}
