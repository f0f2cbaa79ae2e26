//! ============================================================================
//! Offline Providers - No network, deterministic output
//! ============================================================================
//! `HashEmbeddings` maps text to a fixed-size bag-of-words vector using the
//! hashing trick. `ExtractiveModel` answers by quoting the retrieved memos.
//! Both back `--offline` mode and stand in for the hosted services in tests.
//! ============================================================================

use async_trait::async_trait;

use super::{ChatModel, ContextDocument, EmbeddingProvider};
use crate::types::MemoResult;

/// Default dimension for hashed embeddings
pub const HASH_EMBEDDING_DIM: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hashing-trick embeddings over lowercase word tokens
#[derive(Debug, Clone)]
pub struct HashEmbeddings {
    dim: usize,
}

impl HashEmbeddings {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    /// Embed synchronously. All-zero only for blank text.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];

        let mut tokens: Vec<String> = tokenize(text).collect();
        if tokens.is_empty() {
            // Punctuation or emoji only: hash the raw chunks instead
            tokens = text.split_whitespace().map(str::to_string).collect();
        }

        for token in tokens {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dim as u64) as usize;
            // High bit picks the sign so collisions tend to cancel
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbeddings {
    fn default() -> Self {
        Self::new(HASH_EMBEDDING_DIM)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddings {
    async fn embed(&self, texts: &[String]) -> MemoResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn name(&self) -> &str {
        "hash-embeddings"
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

/// Answers by listing the memos it was handed; never adds content of its own
#[derive(Debug, Clone, Default)]
pub struct ExtractiveModel;

#[async_trait]
impl ChatModel for ExtractiveModel {
    async fn generate(&self, question: &str, context: &[ContextDocument]) -> MemoResult<String> {
        if context.is_empty() {
            return Ok(format!(
                "I couldn't find anything in your memos about \"{}\".",
                question.trim()
            ));
        }

        let mut answer = String::from("Here is what your memos say:");
        for doc in context {
            answer.push_str(&format!("\n- {}: {}", doc.date, doc.text.trim()));
        }
        Ok(answer)
    }

    fn name(&self) -> &str {
        "extractive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_identical_text_identical_vector() {
        let emb = HashEmbeddings::default();
        let a = emb.embed_text("Buy milk");
        let b = emb.embed_text("buy   MILK!");
        assert_eq!(a, b);
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_related_text_scores_higher() {
        let emb = HashEmbeddings::default();
        let query = emb.embed_text("when is the dentist");
        let dentist = emb.embed_text("dentist appointment at 3pm");
        let groceries = emb.embed_text("buy eggs and bread");
        assert!(cosine(&query, &dentist) > cosine(&query, &groceries));
    }

    #[test]
    fn test_non_ascii_tokens() {
        let emb = HashEmbeddings::default();
        let v = emb.embed_text("우유 사기");
        assert!(v.iter().any(|x| *x != 0.0));
    }

    #[test]
    fn test_blank_text_zero_vector() {
        let emb = HashEmbeddings::new(8);
        assert_eq!(emb.embed_text(" \t\n "), vec![0.0; 8]);
    }

    #[test]
    fn test_symbol_only_text_embeds() {
        let emb = HashEmbeddings::default();
        for text in ["!!!", "  ... ", "🎂🎉"] {
            let v = emb.embed_text(text);
            assert!(v.iter().any(|x| *x != 0.0), "{:?} embedded to zero", text);
            assert!((cosine(&v, &emb.embed_text(text)) - 1.0).abs() < 1e-5);
        }
        assert_ne!(emb.embed_text("!!!"), emb.embed_text("???"));
    }

    #[tokio::test]
    async fn test_extractive_quotes_only_context() {
        let docs = vec![ContextDocument {
            text: "Buy milk".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }];
        let answer = ExtractiveModel.generate("what to buy?", &docs).await.unwrap();
        assert_eq!(answer, "Here is what your memos say:\n- 2024-01-01: Buy milk");
    }

    #[tokio::test]
    async fn test_extractive_without_context() {
        let answer = ExtractiveModel.generate("anything?", &[]).await.unwrap();
        assert!(answer.contains("couldn't find"));
    }
}
