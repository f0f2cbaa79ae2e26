//! ============================================================================
//! Index Builder - Full rebuild of the note vector index
//! ============================================================================
//! Every call re-embeds every note in a single batch and returns a fresh
//! `VectorIndex`. There is no incremental update and no embedding cache, so
//! the index can never drift from the note list it was built from.
//! ============================================================================

mod flat;

pub use flat::{ScoredNote, VectorIndex};

use std::sync::Arc;
use tracing::{debug, info};

use crate::providers::EmbeddingProvider;
use crate::types::{MemoError, MemoResult, Note};

/// Builds vector indexes from the current note list
#[derive(Clone)]
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Rebuild from scratch. `None` when there are no notes.
    pub async fn rebuild(&self, notes: &[Note]) -> MemoResult<Option<VectorIndex>> {
        if notes.is_empty() {
            debug!("No notes, index cleared");
            return Ok(None);
        }

        let texts: Vec<String> = notes.iter().map(|n| n.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        if vectors.len() != notes.len() {
            return Err(MemoError::upstream(
                "embeddings",
                format!("expected {} embeddings, got {}", notes.len(), vectors.len()),
            ));
        }

        let index = VectorIndex::from_parts(notes, vectors);
        info!(
            "Rebuilt index over {} notes ({})",
            index.len(),
            self.embedder.name()
        );
        Ok(Some(index))
    }
}
