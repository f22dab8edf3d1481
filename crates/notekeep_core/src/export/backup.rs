//! Full-collection backup document and import payload decoding.
//!
//! # Invariants
//! - Backups carry `{notes, folders, exportDate, version}`.
//! - Import ignores unknown fields and treats missing or `null` arrays as
//!   empty; anything else that does not decode is malformed.

use crate::model::folder::Folder;
use crate::model::note::Note;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format tag written into every backup.
pub const BACKUP_FORMAT_VERSION: &str = "1.0";

/// Borrowed view of the collection serialized by `NotesStore::export_data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument<'a> {
    pub notes: &'a [Note],
    pub folders: &'a [Folder],
    pub export_date: DateTime<Utc>,
    pub version: &'static str,
}

/// Import input: raw JSON text or an already-parsed value.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    Text(String),
    Value(Value),
}

impl From<&str> for ImportPayload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ImportPayload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Value> for ImportPayload {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Decoded import records, before the id merge.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImportedRecords {
    #[serde(default)]
    notes: Option<Vec<Note>>,
    #[serde(default)]
    folders: Option<Vec<Folder>>,
}

impl ImportedRecords {
    pub fn notes(&self) -> &[Note] {
        self.notes.as_deref().unwrap_or_default()
    }

    pub fn folders(&self) -> &[Folder] {
        self.folders.as_deref().unwrap_or_default()
    }

    pub fn into_parts(self) -> (Vec<Note>, Vec<Folder>) {
        (
            self.notes.unwrap_or_default(),
            self.folders.unwrap_or_default(),
        )
    }
}

impl ImportPayload {
    /// Decodes the payload; the error string is suitable for users.
    pub fn decode(self) -> Result<ImportedRecords, String> {
        let value = match self {
            Self::Text(raw) => {
                serde_json::from_str::<Value>(&raw).map_err(|err| format!("not valid JSON: {err}"))?
            }
            Self::Value(value) => value,
        };
        if !value.is_object() {
            return Err("expected a JSON object with `notes` and `folders`".to_string());
        }
        serde_json::from_value(value).map_err(|err| format!("unexpected backup shape: {err}"))
    }
}

/// Outcome of one `NotesStore::import_data` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub notes_added: usize,
    pub notes_skipped: usize,
    pub folders_added: usize,
    pub folders_skipped: usize,
}

impl ImportSummary {
    pub fn added(&self) -> usize {
        self.notes_added + self.folders_added
    }
}
