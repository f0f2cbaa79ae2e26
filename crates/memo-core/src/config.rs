//! ============================================================================
//! Memo Configuration
//! ============================================================================
//! Provider endpoints, model names and retrieval depth. Defaults come from
//! environment variables; the front end may override individual fields.
//! ============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{MemoError, MemoResult};

/// Default OpenAI-compatible API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Number of notes retrieved as context for each question
pub const DEFAULT_TOP_K: usize = 5;

/// Default HTTP timeout for provider calls
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub top_k: usize,
    pub http_timeout_secs: u64,
    /// Use local hashing embeddings and the extractive model instead of the API
    pub offline: bool,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env_or("MEMO_API_BASE_URL", DEFAULT_BASE_URL),
            embedding_model: env_or("MEMO_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            chat_model: env_or("MEMO_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            top_k: env_parse("MEMO_TOP_K").unwrap_or(DEFAULT_TOP_K),
            http_timeout_secs: env_parse("MEMO_HTTP_TIMEOUT_SECS")
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            offline: false,
        }
    }
}

impl MemoConfig {
    /// Configuration for offline use, independent of the environment
    pub fn offline() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            offline: true,
        }
    }

    pub fn validate(&self) -> MemoResult<()> {
        if self.top_k == 0 {
            return Err(MemoError::Config("top_k must be at least 1".to_string()));
        }
        if !self.offline && self.api_key.is_none() {
            return Err(MemoError::Config(
                "OPENAI_API_KEY is not set (use --offline to run without it)".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    parse_setting(key, &std::env::var(key).ok()?)
}

/// Parse a numeric setting, warning when a value is present but unusable
fn parse_setting<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number, using the default", key, raw);
            None
        }
    }
}
