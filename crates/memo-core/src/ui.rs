//! ============================================================================
//! Presentation - Event handlers returning a fresh view
//! ============================================================================
//! Front ends translate user actions into `UiEvent`s and render whatever
//! `View` comes back. No rendering loop lives here.
//!
//! Pattern: event -> session mutation/query -> notice + rows + answer
//! ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::answer::{AnswerOutcome, Answered};
use crate::session::MemoSession;
use crate::types::{MemoError, Notice, NoteId};

pub const NO_NOTES_MESSAGE: &str = "No memos saved yet.";
pub const SAVE_FIRST_MESSAGE: &str = "Save a memo first.";

/// User actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// Save button: current date picker value and text area contents
    Save { date: NaiveDate, text: String },
    /// Per-row delete control
    Delete { id: NoteId },
    /// Ask button with the question box contents
    Ask { question: String },
    /// Re-render without changing anything
    Refresh,
}

/// One rendered note row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRow {
    /// 1-based display position
    pub position: usize,
    pub id: NoteId,
    pub date: NaiveDate,
    pub text: String,
}

/// Everything a front end needs to draw after an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub rows: Vec<NoteRow>,
    pub notice: Option<Notice>,
    pub answer: Option<Answered>,
}

impl View {
    /// Id of the note shown at a 1-based row number
    pub fn row_id(&self, position: usize) -> Option<NoteId> {
        self.rows.iter().find(|r| r.position == position).map(|r| r.id)
    }

    /// Shown in place of the list when it is empty
    pub fn empty_list_notice(&self) -> Option<Notice> {
        self.rows.is_empty().then(|| Notice::info(NO_NOTES_MESSAGE))
    }
}

/// Apply one event to the session and describe the result
pub async fn handle(session: &mut MemoSession, event: UiEvent) -> View {
    let (notice, answer) = match event {
        UiEvent::Save { date, text } => match session.add_note(&text, date).await {
            Ok(Some(note)) => (Some(Notice::success(format!("{} memo saved!", note.date))), None),
            Ok(None) => (None, None),
            Err(e) => (Some(failure_notice(&e)), None),
        },
        UiEvent::Delete { id } => match session.delete_note(id).await {
            Ok(Some(note)) => {
                info!("Row for {} removed", note.date);
                (None, None)
            }
            Ok(None) => (None, None),
            Err(e) => (Some(failure_notice(&e)), None),
        },
        UiEvent::Ask { question } => match session.ask(&question).await {
            Ok(AnswerOutcome::Answered(answered)) => (None, Some(answered)),
            Ok(AnswerOutcome::NoNotes) => (Some(Notice::warning(SAVE_FIRST_MESSAGE)), None),
            Ok(AnswerOutcome::Skipped) => (None, None),
            Err(e) => (Some(failure_notice(&e)), None),
        },
        UiEvent::Refresh => (None, None),
    };

    View {
        rows: rows(session),
        notice,
        answer,
    }
}

/// Current rows without applying any event
pub fn rows(session: &MemoSession) -> Vec<NoteRow> {
    session
        .notes()
        .iter()
        .enumerate()
        .map(|(i, note)| NoteRow {
            position: i + 1,
            id: note.id,
            date: note.date,
            text: note.text.clone(),
        })
        .collect()
}

fn failure_notice(e: &MemoError) -> Notice {
    error!("Action failed: {}", e);
    Notice::error(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoConfig;
    use crate::providers::{
        ChatModel, ContextDocument, EmbeddingProvider, ExtractiveModel, HashEmbeddings,
    };
    use crate::types::{MemoResult, NoticeLevel};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Hash embeddings that start failing once `failing` is set
    #[derive(Default)]
    struct OutageEmbedder {
        inner: HashEmbeddings,
        failing: AtomicBool,
    }

    #[async_trait]
    impl EmbeddingProvider for OutageEmbedder {
        async fn embed(&self, texts: &[String]) -> MemoResult<Vec<Vec<f32>>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(MemoError::upstream("embeddings", "service unavailable"));
            }
            self.inner.embed(texts).await
        }

        fn name(&self) -> &str {
            "outage"
        }
    }

    struct DownModel;

    #[async_trait]
    impl ChatModel for DownModel {
        async fn generate(&self, _question: &str, _context: &[ContextDocument]) -> MemoResult<String> {
            Err(MemoError::upstream("chat", "rate limited"))
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    fn assert_upstream_error(view: &View) {
        let notice = view.notice.as_ref().expect("error notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("upstream service failure: "));
        assert!(view.answer.is_none());
    }

    fn session() -> MemoSession {
        MemoSession::new(
            Arc::new(HashEmbeddings::default()),
            Arc::new(ExtractiveModel),
            &MemoConfig::offline(),
        )
    }

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn save(text: &str, date: NaiveDate) -> UiEvent {
        UiEvent::Save { date, text: text.to_string() }
    }

    #[tokio::test]
    async fn test_save_shows_success_and_row() {
        let mut session = session();
        let view = handle(&mut session, save("Buy milk", jan(1))).await;

        assert_eq!(view.notice, Some(Notice::success("2024-01-01 memo saved!")));
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].position, 1);
        assert_eq!(view.rows[0].text, "Buy milk");
        assert!(view.empty_list_notice().is_none());
    }

    #[tokio::test]
    async fn test_blank_save_is_silent() {
        let mut session = session();
        let view = handle(&mut session, save("   ", jan(1))).await;
        assert!(view.notice.is_none());
        assert!(view.rows.is_empty());
        assert_eq!(view.empty_list_notice().unwrap().level, NoticeLevel::Info);
    }

    #[tokio::test]
    async fn test_delete_by_row_id() {
        let mut session = session();
        handle(&mut session, save("first", jan(1))).await;
        let view = handle(&mut session, save("second", jan(2))).await;

        let id = view.row_id(1).unwrap();
        let view = handle(&mut session, UiEvent::Delete { id }).await;
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].text, "second");
        assert_eq!(view.rows[0].position, 1);

        // Stale row from an older view is a no-op
        let view = handle(&mut session, UiEvent::Delete { id }).await;
        assert_eq!(view.rows.len(), 1);
        assert!(view.notice.is_none());
    }

    #[tokio::test]
    async fn test_ask_before_saving_warns() {
        let mut session = session();
        let view = handle(&mut session, UiEvent::Ask { question: "anything?".into() }).await;
        assert_eq!(view.notice, Some(Notice::warning(SAVE_FIRST_MESSAGE)));
        assert!(view.answer.is_none());
    }

    #[tokio::test]
    async fn test_blank_question_is_silent() {
        let mut session = session();
        handle(&mut session, save("Buy milk", jan(1))).await;
        let view = handle(&mut session, UiEvent::Ask { question: " ".into() }).await;
        assert!(view.notice.is_none());
        assert!(view.answer.is_none());
    }

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let mut session = session();
        handle(&mut session, save("Buy milk", jan(1))).await;
        let view = handle(&mut session, UiEvent::Ask { question: "what to buy".into() }).await;

        let answered = view.answer.unwrap();
        assert!(answered.answer.contains("Buy milk"));
        assert_eq!(answered.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_embedding_outage_shows_error_notice() {
        let embedder = Arc::new(OutageEmbedder::default());
        let mut session =
            MemoSession::new(embedder.clone(), Arc::new(ExtractiveModel), &MemoConfig::offline());
        handle(&mut session, save("Buy milk", jan(1))).await;
        // Two notes so a delete still has something left to re-embed
        let before = handle(&mut session, save("Renew passport", jan(3))).await.rows;

        embedder.failing.store(true, Ordering::SeqCst);

        let view = handle(&mut session, save("Call grandma", jan(2))).await;
        assert_upstream_error(&view);
        assert_eq!(
            view.notice.as_ref().unwrap().message,
            "upstream service failure: embeddings: service unavailable"
        );
        assert_eq!(view.rows, before);

        let view = handle(&mut session, UiEvent::Delete { id: before[0].id }).await;
        assert_upstream_error(&view);
        assert_eq!(view.rows, before);

        let view = handle(&mut session, UiEvent::Ask { question: "what to buy".into() }).await;
        assert_upstream_error(&view);
        assert_eq!(view.rows, before);
    }

    #[tokio::test]
    async fn test_model_outage_shows_error_notice() {
        let mut session = MemoSession::new(
            Arc::new(HashEmbeddings::default()),
            Arc::new(DownModel),
            &MemoConfig::offline(),
        );
        let before = handle(&mut session, save("Buy milk", jan(1))).await.rows;

        let view = handle(&mut session, UiEvent::Ask { question: "what to buy".into() }).await;
        assert_upstream_error(&view);
        assert_eq!(view.notice.unwrap().message, "upstream service failure: chat: rate limited");
        assert_eq!(view.rows, before);
    }

    #[test]
    fn test_event_json_shape() {
        let event: UiEvent =
            serde_json::from_str(r#"{"type": "save", "date": "2024-01-01", "text": "Buy milk"}"#)
                .unwrap();
        assert_eq!(event, save("Buy milk", jan(1)));
    }
}
