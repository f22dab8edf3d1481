//! Note and folder domain model.
//!
//! # Responsibility
//! - Define the records persisted, exported and imported by the store.
//! - Own the versioning rule for content changes and the tag normalization.
//!
//! # Invariants
//! - A folder never owns notes; notes point at folders via `folder_id`.
//! - Records are only mutated through `NotesStore` operations.

pub mod folder;
pub mod note;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Invariant violation found on a note or folder record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Record id is empty or whitespace.
    EmptyId,
    /// Note version must start at 1.
    ZeroVersion { id: String },
    /// `is_encrypted` and `password_check` disagree.
    EncryptionStateMismatch { id: String, is_encrypted: bool },
    /// History holds more entries than the cap.
    HistoryOverflow { id: String, len: usize },
    /// `updated_at` lies before `created_at`.
    UpdatedBeforeCreated { id: String },
    /// Two checklist items share one id.
    DuplicateChecklistItem { id: String, item_id: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "record id must not be empty"),
            Self::ZeroVersion { id } => write!(f, "note {id} has version 0"),
            Self::EncryptionStateMismatch { id, is_encrypted } => write!(
                f,
                "note {id} has isEncrypted={is_encrypted} but passwordCheck disagrees"
            ),
            Self::HistoryOverflow { id, len } => write!(
                f,
                "note {id} has {len} history entries, more than {}",
                note::HISTORY_LIMIT
            ),
            Self::UpdatedBeforeCreated { id } => {
                write!(f, "record {id} was updated before it was created")
            }
            Self::DuplicateChecklistItem { id, item_id } => {
                write!(f, "note {id} repeats checklist item {item_id}")
            }
        }
    }
}

impl Error for ValidationError {}
