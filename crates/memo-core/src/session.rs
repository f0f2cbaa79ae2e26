//! ============================================================================
//! Memo Session - Explicit per-session state
//! ============================================================================
//! Owns the note list and the index built from it. A session starts empty,
//! lives as long as its owner keeps it, and is gone on drop; nothing is
//! written to disk.
//!
//! Every successful add/delete rebuilds the index before returning. If the
//! rebuild fails the mutation is undone, so `index` always matches `notes`.
//! ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::answer::{AnswerOutcome, AnswerService};
use crate::config::MemoConfig;
use crate::index::{IndexBuilder, VectorIndex};
use crate::notes::NoteStore;
use crate::providers::{ChatModel, EmbeddingProvider};
use crate::types::{MemoResult, Note, NoteId};

/// Serializable view of a session's notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub exported_at: String,
    pub note_count: usize,
    pub notes: Vec<Note>,
}

pub struct MemoSession {
    notes: NoteStore,
    index: Option<VectorIndex>,
    builder: IndexBuilder,
    answers: AnswerService,
}

impl MemoSession {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn ChatModel>,
        config: &MemoConfig,
    ) -> Self {
        debug!("Starting memo session (top_k = {})", config.top_k);
        Self {
            notes: NoteStore::new(),
            index: None,
            builder: IndexBuilder::new(embedder.clone()),
            answers: AnswerService::new(embedder, model).with_top_k(config.top_k),
        }
    }

    /// Save a memo. `Ok(None)` when the text is blank.
    pub async fn add_note(&mut self, text: &str, date: NaiveDate) -> MemoResult<Option<Note>> {
        let Some(note) = self.notes.add(text, date) else {
            return Ok(None);
        };

        if let Err(e) = self.reindex().await {
            warn!("Rebuild failed after adding {}, rolling back: {}", note.id, e);
            self.notes.pop();
            return Err(e);
        }

        Ok(Some(note))
    }

    /// Delete a memo by id. `Ok(None)` when the id is unknown.
    pub async fn delete_note(&mut self, id: NoteId) -> MemoResult<Option<Note>> {
        match self.notes.position(id) {
            Some(position) => self.delete_at(position).await,
            None => {
                warn!("Delete requested for unknown note {}", id);
                Ok(None)
            }
        }
    }

    /// Delete the memo at a zero-based position. `Ok(None)` when out of bounds.
    pub async fn delete_at(&mut self, position: usize) -> MemoResult<Option<Note>> {
        let Some(note) = self.notes.delete_at(position) else {
            return Ok(None);
        };

        if let Err(e) = self.reindex().await {
            warn!("Rebuild failed after deleting {}, rolling back: {}", note.id, e);
            self.notes.restore(position, note);
            return Err(e);
        }

        Ok(Some(note))
    }

    /// Ask a question against the current index
    pub async fn ask(&self, question: &str) -> MemoResult<AnswerOutcome> {
        self.answers.answer(question, self.index.as_ref()).await
    }

    pub fn notes(&self) -> &[Note] {
        self.notes.list()
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            exported_at: chrono::Utc::now().to_rfc3339(),
            note_count: self.notes.len(),
            notes: self.notes.list().to_vec(),
        }
    }

    /// Replace the index only after the new one is fully built
    async fn reindex(&mut self) -> MemoResult<()> {
        let index = self.builder.rebuild(self.notes.list()).await?;
        info!(
            "Index now covers {} notes",
            index.as_ref().map_or(0, VectorIndex::len)
        );
        self.index = index;
        Ok(())
    }
}
