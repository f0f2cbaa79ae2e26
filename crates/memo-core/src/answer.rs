//! ============================================================================
//! Answer Service - Retrieval-augmented answers over saved memos
//! ============================================================================
//! Embeds the question, pulls the top-k nearest memos from the current index
//! and hands them to the chat model. Nothing is cached: every question is a
//! fresh retrieval and a fresh generation.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DEFAULT_TOP_K;
use crate::index::{ScoredNote, VectorIndex};
use crate::providers::{ChatModel, ContextDocument, EmbeddingProvider};
use crate::types::MemoResult;

/// Answer text plus the memos it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answered {
    pub question: String,
    pub answer: String,
    pub sources: Vec<ScoredNote>,
}

/// Result of asking a question
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Blank question; nothing was asked
    Skipped,
    /// No memos saved yet, so there is no index to search
    NoNotes,
    Answered(Answered),
}

pub struct AnswerService {
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn ChatModel>,
    top_k: usize,
}

impl AnswerService {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            embedder,
            model,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn answer(
        &self,
        question: &str,
        index: Option<&VectorIndex>,
    ) -> MemoResult<AnswerOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(AnswerOutcome::Skipped);
        }

        let Some(index) = index.filter(|index| !index.is_empty()) else {
            debug!("Question asked before any memo was saved");
            return Ok(AnswerOutcome::NoNotes);
        };

        let query_vector = self.embedder.embed_one(question).await?;
        let sources = index.query(&query_vector, self.top_k);
        debug!("Retrieved {} of {} memos for question", sources.len(), index.len());

        let context: Vec<ContextDocument> = sources
            .iter()
            .map(|hit| ContextDocument {
                text: hit.text.clone(),
                date: hit.date,
            })
            .collect();

        let answer = self.model.generate(question, &context).await?;
        info!("Answered question using {} memos ({})", sources.len(), self.model.name());

        Ok(AnswerOutcome::Answered(Answered {
            question: question.to_string(),
            answer,
            sources,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::providers::{ExtractiveModel, HashEmbeddings};
    use crate::types::{MemoError, Note};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records how often it was called
    #[derive(Default)]
    struct CountingModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for CountingModel {
        async fn generate(&self, _question: &str, context: &[ContextDocument]) -> MemoResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{} memos", context.len()))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn generate(&self, _question: &str, _context: &[ContextDocument]) -> MemoResult<String> {
            Err(MemoError::upstream("chat", "quota exceeded"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    async fn index_of(texts: &[&str]) -> VectorIndex {
        let notes: Vec<Note> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Note::new(t.to_string(), NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap())
            })
            .collect();
        IndexBuilder::new(Arc::new(HashEmbeddings::default()))
            .rebuild(&notes)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_blank_question_skipped() {
        let model = Arc::new(CountingModel::default());
        let service = AnswerService::new(Arc::new(HashEmbeddings::default()), model.clone());
        let index = index_of(&["Buy milk"]).await;

        let outcome = service.answer("   ", Some(&index)).await.unwrap();
        assert_eq!(outcome, AnswerOutcome::Skipped);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_index_is_no_notes() {
        let model = Arc::new(CountingModel::default());
        let service = AnswerService::new(Arc::new(HashEmbeddings::default()), model.clone());

        let outcome = service.answer("what did I plan?", None).await.unwrap();
        assert_eq!(outcome, AnswerOutcome::NoNotes);

        let empty = VectorIndex::from_parts(&[], Vec::new());
        let outcome = service.answer("what did I plan?", Some(&empty)).await.unwrap();
        assert_eq!(outcome, AnswerOutcome::NoNotes);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_context_limited_to_top_k() {
        let texts: Vec<String> = (0..8).map(|i| format!("memo number {}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let index = index_of(&refs).await;

        let service = AnswerService::new(
            Arc::new(HashEmbeddings::default()),
            Arc::new(CountingModel::default()),
        );
        let AnswerOutcome::Answered(answered) = service.answer("memo", Some(&index)).await.unwrap()
        else {
            panic!("expected an answer");
        };
        assert_eq!(answered.sources.len(), 5);
        assert_eq!(answered.answer, "5 memos");
    }

    #[tokio::test]
    async fn test_answer_grounded_in_saved_memos() {
        let index = index_of(&["Buy milk", "Dentist appointment at 3pm"]).await;
        let service = AnswerService::new(Arc::new(HashEmbeddings::default()), Arc::new(ExtractiveModel));

        let AnswerOutcome::Answered(answered) =
            service.answer("when is the dentist?", Some(&index)).await.unwrap()
        else {
            panic!("expected an answer");
        };
        assert_eq!(answered.sources[0].text, "Dentist appointment at 3pm");
        assert!(answered.answer.contains("Dentist appointment at 3pm"));
        assert!(!answered.answer.contains("Yoga"));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let index = index_of(&["Buy milk"]).await;
        let service = AnswerService::new(Arc::new(HashEmbeddings::default()), Arc::new(FailingModel));
        let err = service.answer("milk?", Some(&index)).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[test]
    fn test_top_k_never_zero() {
        let service = AnswerService::new(Arc::new(HashEmbeddings::default()), Arc::new(ExtractiveModel))
            .with_top_k(0);
        assert_eq!(service.top_k(), 1);
    }
}
