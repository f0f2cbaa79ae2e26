//! ============================================================================
//! Providers - Embedding and language-model services
//! ============================================================================
//! The hosted services sit behind two traits so the session never depends on
//! a concrete client:
//! - `EmbeddingProvider`: text -> vector
//! - `ChatModel`: question + retrieved memos -> answer text
//!
//! HTTP implementations talk to OpenAI-compatible APIs; offline
//! implementations run without network access.
//! ============================================================================

mod chat;
mod embeddings;
mod offline;

pub use chat::{format_context, OpenAiChat};
pub use embeddings::OpenAiEmbeddings;
pub use offline::{ExtractiveModel, HashEmbeddings, HASH_EMBEDDING_DIM};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::MemoConfig;
use crate::types::{MemoError, MemoResult};

/// A retrieved memo handed to the chat model as grounding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    pub text: String,
    pub date: NaiveDate,
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch; output order matches input order
    async fn embed(&self, texts: &[String]) -> MemoResult<Vec<Vec<f32>>>;

    async fn embed_one(&self, text: &str) -> MemoResult<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MemoError::upstream("embeddings", "no embedding returned"))
    }

    fn name(&self) -> &str;
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, question: &str, context: &[ContextDocument]) -> MemoResult<String>;

    fn name(&self) -> &str;
}

/// Pick providers for the given configuration
pub fn create_providers(
    config: &MemoConfig,
) -> MemoResult<(Arc<dyn EmbeddingProvider>, Arc<dyn ChatModel>)> {
    if config.offline {
        info!("Using offline providers (hash embeddings, extractive answers)");
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbeddings::default());
        let model: Arc<dyn ChatModel> = Arc::new(ExtractiveModel);
        return Ok((embedder, model));
    }

    if config.api_key.is_none() {
        warn!("No API key configured for online providers");
    }

    let embeddings = OpenAiEmbeddings::from_config(config)?;
    let chat = OpenAiChat::from_config(config)?;
    info!(
        "Using {} for embeddings and {} for answers at {}",
        embeddings.model(),
        chat.model(),
        config.base_url
    );
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embeddings);
    let model: Arc<dyn ChatModel> = Arc::new(chat);
    Ok((embedder, model))
}
