//! ============================================================================
//! MEMO-CORE: Calendar Memo Engine
//! ============================================================================
//! Date-tagged notes with retrieval-augmented question answering:
//! - Session-scoped note store (append, delete)
//! - Full vector index rebuild after every mutation
//! - Top-k retrieval + hosted chat model for answers
//! - Event handlers that return a renderable view
//! ============================================================================

pub mod answer;
pub mod config;
pub mod index;
pub mod notes;
pub mod providers;
pub mod session;
pub mod types;
pub mod ui;

// Re-export main types for convenience
pub use answer::{AnswerOutcome, AnswerService, Answered};
pub use config::MemoConfig;
pub use index::{IndexBuilder, ScoredNote, VectorIndex};
pub use notes::NoteStore;
pub use providers::{create_providers, ChatModel, ContextDocument, EmbeddingProvider};
pub use session::{MemoSession, SessionSnapshot};
pub use types::*;
pub use ui::{NoteRow, UiEvent, View};
