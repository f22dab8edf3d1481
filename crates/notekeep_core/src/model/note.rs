//! Note record, its nested value types and partial-update structures.
//!
//! # Invariants
//! - `version` starts at 1 and moves by exactly 1 per differing content change.
//! - `history` is ordered oldest first and never exceeds `HISTORY_LIMIT`.
//! - `is_encrypted == password_check.is_some()`.
//! - `updated_at >= created_at`; `touch` never moves `updated_at` backwards.
//! - Checklist item ids are unique within one note.

use crate::ids::generate_id;
use crate::model::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

/// Maximum number of history entries kept per note.
pub const HISTORY_LIMIT: usize = 50;

/// Title given to notes created without one.
pub const DEFAULT_NOTE_TITLE: &str = "New note";

pub type NoteId = String;

/// Editing mode of a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[default]
    Text,
    Checklist,
}

/// One-shot reminder attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub datetime: DateTime<Utc>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Reminder {
    pub fn new(datetime: DateTime<Utc>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            datetime,
            message: if message.trim().is_empty() {
                None
            } else {
                Some(message)
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(),
            text: text.into(),
            completed: false,
            created_at: now,
        }
    }
}

/// Snapshot of content replaced by a later update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Version the content had before it was replaced.
    pub version: u64,
}

/// Single user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    /// Rich-text HTML, or ciphertext while `is_encrypted` is set.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_encrypted: bool,
    /// One-way hash of the lock password. Older backups call it `password`.
    #[serde(default, alias = "password")]
    pub password_check: Option<String>,
    #[serde(default)]
    pub reminder: Option<Reminder>,
    /// Attachment records are owned by the editor; carried verbatim.
    #[serde(default)]
    pub attachments: Vec<Value>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(rename = "type", default)]
    pub kind: NoteType,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "initial_version")]
    pub version: u64,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

fn initial_version() -> u64 {
    1
}

impl Note {
    /// Creates an unpinned, unencrypted note at version 1.
    pub fn new(id: NoteId, init: NewNote, folder_id: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: init
                .title
                .unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_string()),
            content: init.content.unwrap_or_default(),
            folder_id,
            is_pinned: false,
            is_encrypted: false,
            password_check: None,
            reminder: None,
            attachments: Vec::new(),
            tags: BTreeSet::new(),
            kind: init.kind.unwrap_or_default(),
            checklist: Vec::new(),
            created_at: now,
            updated_at: now,
            version: initial_version(),
            history: Vec::new(),
        }
    }

    /// Bumps `updated_at` to `now` unless that would move it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Replaces content, recording the previous value in history.
    ///
    /// Returns `false` and changes nothing when the content is identical.
    pub fn replace_content(&mut self, content: String, now: DateTime<Utc>) -> bool {
        if content == self.content {
            return false;
        }

        let previous = std::mem::replace(&mut self.content, content);
        self.history.push(HistoryEntry {
            id: generate_id(),
            content: previous,
            timestamp: now,
            version: self.version,
        });
        if self.history.len() > HISTORY_LIMIT {
            let overflow = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..overflow);
        }
        self.version += 1;
        true
    }

    /// Replaces the checklist, keeping the first item for any repeated id.
    /// The note type is left alone.
    ///
    /// Returns how many items were dropped as duplicates.
    pub fn replace_checklist(&mut self, items: Vec<ChecklistItem>) -> usize {
        let mut seen = HashSet::new();
        let before = items.len();
        self.checklist = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        before - self.checklist.len()
    }

    /// Like `replace_checklist`, then switches the note to a checklist.
    pub fn set_checklist(&mut self, items: Vec<ChecklistItem>) -> usize {
        let dropped = self.replace_checklist(items);
        self.kind = NoteType::Checklist;
        dropped
    }

    /// Checks every record-level invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.version == 0 {
            return Err(ValidationError::ZeroVersion {
                id: self.id.clone(),
            });
        }
        if self.is_encrypted != self.password_check.is_some() {
            return Err(ValidationError::EncryptionStateMismatch {
                id: self.id.clone(),
                is_encrypted: self.is_encrypted,
            });
        }
        if self.history.len() > HISTORY_LIMIT {
            return Err(ValidationError::HistoryOverflow {
                id: self.id.clone(),
                len: self.history.len(),
            });
        }
        if self.updated_at < self.created_at {
            return Err(ValidationError::UpdatedBeforeCreated {
                id: self.id.clone(),
            });
        }

        let mut seen = HashSet::new();
        for item in &self.checklist {
            if !seen.insert(item.id.as_str()) {
                return Err(ValidationError::DuplicateChecklistItem {
                    id: self.id.clone(),
                    item_id: item.id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Case-insensitive substring match against title or content.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }
}

/// Initial fields for `NotesStore::create_note`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub kind: Option<NoteType>,
}

impl NewNote {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Partial update for `NotesStore::update_note`.
///
/// Each `Some` field overwrites the matching attribute and nothing else.
/// Encryption state and reminders change only through their own operations.
/// `content` is ignored while the note is encrypted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` moves the note out of any folder.
    pub folder_id: Option<Option<String>>,
    pub is_pinned: Option<bool>,
    pub attachments: Option<Vec<Value>>,
    pub tags: Option<Vec<String>>,
    pub kind: Option<NoteType>,
    pub checklist: Option<Vec<ChecklistItem>>,
}

impl NotePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Normalizes one tag: trimmed, lowercased, `None` when blank.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values, dropping blanks.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> BTreeSet<String> {
    tags.iter()
        .filter_map(|tag| normalize_tag(tag.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_tags, ChecklistItem, NewNote, Note, NoteType, HISTORY_LIMIT,
    };
    use crate::model::ValidationError;
    use chrono::{Duration, TimeZone, Utc};

    fn sample_note() -> Note {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Note::new("n1".to_string(), NewNote::titled("Groceries"), None, now)
    }

    #[test]
    fn replace_content_ignores_identical_value() {
        let mut note = sample_note();
        let now = note.created_at;
        assert!(!note.replace_content(String::new(), now));
        assert_eq!(note.version, 1);
        assert!(note.history.is_empty());
    }

    #[test]
    fn replace_content_records_previous_version() {
        let mut note = sample_note();
        let now = note.created_at;
        assert!(note.replace_content("milk".to_string(), now));
        assert!(note.replace_content("milk, eggs".to_string(), now));

        assert_eq!(note.version, 3);
        assert_eq!(note.history.len(), 2);
        assert_eq!(note.history[0].content, "");
        assert_eq!(note.history[0].version, 1);
        assert_eq!(note.history[1].content, "milk");
        assert_eq!(note.history[1].version, 2);
    }

    #[test]
    fn history_drops_oldest_entries_past_limit() {
        let mut note = sample_note();
        let now = note.created_at;
        for idx in 0..(HISTORY_LIMIT + 5) {
            note.replace_content(format!("rev {idx}"), now);
        }
        assert_eq!(note.history.len(), HISTORY_LIMIT);
        assert_eq!(note.history[0].content, "rev 4");
        assert_eq!(note.version as usize, HISTORY_LIMIT + 6);
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut note = sample_note();
        let created = note.created_at;
        note.touch(created - Duration::hours(1));
        assert_eq!(note.updated_at, created);
        note.touch(created + Duration::hours(1));
        assert_eq!(note.updated_at, created + Duration::hours(1));
    }

    #[test]
    fn set_checklist_keeps_first_of_repeated_ids() {
        let mut note = sample_note();
        let now = note.created_at;
        let first = ChecklistItem::new("a", now);
        let mut repeat = ChecklistItem::new("b", now);
        repeat.id = first.id.clone();

        let dropped = note.set_checklist(vec![first.clone(), repeat]);
        assert_eq!(dropped, 1);
        assert_eq!(note.checklist, vec![first]);
        assert_eq!(note.kind, NoteType::Checklist);
    }

    #[test]
    fn validate_rejects_encryption_mismatch() {
        let mut note = sample_note();
        note.is_encrypted = true;
        assert_eq!(
            note.validate().unwrap_err(),
            ValidationError::EncryptionStateMismatch {
                id: "n1".to_string(),
                is_encrypted: true
            }
        );
    }

    #[test]
    fn normalize_tags_lowercases_and_dedupes() {
        let tags = normalize_tags(&["Work", " work ", "", "Home"]);
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["home".to_string(), "work".to_string()]
        );
    }

    #[test]
    fn deserializes_legacy_password_field_and_defaults() {
        let value = serde_json::json!({
            "id": "legacy",
            "title": "Old",
            "content": "cipher",
            "isEncrypted": true,
            "password": "abc",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });
        let note: Note = serde_json::from_value(value).unwrap();
        assert_eq!(note.password_check.as_deref(), Some("abc"));
        assert_eq!(note.version, 1);
        assert_eq!(note.kind, NoteType::Text);
        assert!(note.validate().is_ok());
    }
}
