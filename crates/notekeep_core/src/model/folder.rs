//! Folder record.

use crate::model::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FOLDER_COLOR: &str = "#007aff";
pub const DEFAULT_FOLDER_ICON: &str = "📁";

pub type FolderId = String;

/// Named grouping referenced by notes through `Note::folder_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_color() -> String {
    DEFAULT_FOLDER_COLOR.to_string()
}

fn default_icon() -> String {
    DEFAULT_FOLDER_ICON.to_string()
}

impl Folder {
    pub fn new(id: FolderId, init: NewFolder, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: init.name,
            color: init.color.unwrap_or_else(default_color),
            icon: init.icon.unwrap_or_else(default_icon),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.updated_at < self.created_at {
            return Err(ValidationError::UpdatedBeforeCreated {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

/// Initial fields for `NotesStore::create_folder`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFolder {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl NewFolder {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update for `NotesStore::update_folder`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Folder, NewFolder, DEFAULT_FOLDER_COLOR, DEFAULT_FOLDER_ICON};
    use chrono::{TimeZone, Utc};

    #[test]
    fn new_folder_applies_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let folder = Folder::new("f1".to_string(), NewFolder::named("Work"), now);
        assert_eq!(folder.color, DEFAULT_FOLDER_COLOR);
        assert_eq!(folder.icon, DEFAULT_FOLDER_ICON);
        assert_eq!(folder.created_at, folder.updated_at);
    }

    #[test]
    fn folder_wire_fields_are_camel_case() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let folder = Folder::new("f1".to_string(), NewFolder::named("Work"), now);
        let json = serde_json::to_value(&folder).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["name"], "Work");
    }
}
