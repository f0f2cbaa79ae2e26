//! ============================================================================
//! Note Store - Ordered, session-scoped list of memos
//! ============================================================================
//! Append and delete only. Notes are addressed by their stable `NoteId`;
//! positional delete is kept for row controls that only know a list position.
//! The store itself never touches the index: `MemoSession` pairs every
//! successful mutation with a full rebuild.
//! ============================================================================

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::types::{Note, NoteId};

/// In-memory note list, insertion ordered
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a note. Blank text (after trimming) is ignored.
    pub fn add(&mut self, text: &str, date: NaiveDate) -> Option<Note> {
        if text.trim().is_empty() {
            debug!("Ignoring blank note for {}", date);
            return None;
        }

        let note = Note::new(text.to_string(), date);
        self.notes.push(note.clone());
        info!("Added note {} for {} ({} total)", note.id, date, self.notes.len());
        Some(note)
    }

    /// Remove the note with the given id. Unknown ids are a no-op.
    pub fn delete(&mut self, id: NoteId) -> Option<Note> {
        let position = self.position(id)?;
        self.delete_at(position)
    }

    /// Remove the note at a zero-based position. Out of bounds is a no-op.
    pub fn delete_at(&mut self, position: usize) -> Option<Note> {
        if position >= self.notes.len() {
            debug!("Delete position {} out of bounds ({} notes)", position, self.notes.len());
            return None;
        }

        let note = self.notes.remove(position);
        info!("Deleted note {} ({} remaining)", note.id, self.notes.len());
        Some(note)
    }

    /// Put a previously removed note back at its old position
    pub(crate) fn restore(&mut self, position: usize, note: Note) {
        let position = position.min(self.notes.len());
        self.notes.insert(position, note);
    }

    /// Drop the most recently appended note
    pub(crate) fn pop(&mut self) -> Option<Note> {
        self.notes.pop()
    }

    pub fn position(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|n| n.id == id)
    }

    pub fn list(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
