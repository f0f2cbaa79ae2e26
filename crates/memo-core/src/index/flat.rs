//! Flat (brute-force) cosine index over note embeddings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{Note, NoteId};

/// One indexed note: its vector plus the metadata needed to cite it
#[derive(Debug, Clone)]
struct IndexEntry {
    id: NoteId,
    text: String,
    date: NaiveDate,
    vector: Vec<f32>,
}

/// A retrieval hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredNote {
    pub id: NoteId,
    pub text: String,
    pub date: NaiveDate,
    /// Cosine similarity in [-1, 1]
    pub score: f64,
}

/// Immutable in-memory vector index. Built in one shot, never updated.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Pair each note with its vector. Callers guarantee equal lengths.
    pub(crate) fn from_parts(notes: &[Note], vectors: Vec<Vec<f32>>) -> Self {
        let entries = notes
            .iter()
            .zip(vectors)
            .map(|(note, vector)| IndexEntry {
                id: note.id,
                text: note.text.clone(),
                date: note.date,
                vector,
            })
            .collect();
        Self { entries }
    }

    /// Top `k` entries by cosine similarity, best first
    pub fn query(&self, query_vector: &[f32], k: usize) -> Vec<ScoredNote> {
        let mut hits: Vec<(usize, f64)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(pos, entry)| {
                cosine_similarity(query_vector, &entry.vector).map(|score| (pos, score))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(k);

        hits.into_iter()
            .map(|(pos, score)| {
                let entry = &self.entries[pos];
                ScoredNote {
                    id: entry.id,
                    text: entry.text.clone(),
                    date: entry.date,
                    score,
                }
            })
            .collect()
    }

    /// Indexed note ids in insertion order
    pub fn ids(&self) -> Vec<NoteId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x64 = f64::from(x);
        let y64 = f64::from(y);
        dot += x64 * y64;
        norm_a += x64 * x64;
        norm_b += y64 * y64;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some(dot / denom)
}
