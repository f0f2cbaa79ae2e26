//! ============================================================================
//! Core Types for Calendar Memo
//! ============================================================================
//! Notes, identifiers, user-facing notices and the error type shared by every
//! module. Serializable so the front end can export or display them as JSON.
//! ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a note, independent of its position in the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub Uuid);

impl NoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A date-tagged memo. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Memo text, never blank
    pub text: String,
    /// Calendar date the memo is filed under
    pub date: NaiveDate,
    /// Unix timestamp when the note was saved
    pub created_at: i64,
}

impl Note {
    /// Create a new note. Callers are responsible for rejecting blank text.
    pub fn new(text: String, date: NaiveDate) -> Self {
        Self {
            id: NoteId::new(),
            text,
            date,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Severity of a user-visible message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A message shown to the user after an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Error types for the memo core
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoError {
    /// Embedding or language-model service failed (network, quota, bad response)
    #[error("upstream service failure: {service}: {message}")]
    Upstream { service: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl MemoError {
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream { service: service.into(), message: message.into() }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, MemoError::Upstream { .. })
    }
}

pub type MemoResult<T> = Result<T, MemoError>;
