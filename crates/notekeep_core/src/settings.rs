//! User preferences record and its persistence.
//!
//! # Responsibility
//! - Define one typed settings record with per-field defaults.
//! - Update fields by key against a closed set of recognized keys.
//!
//! # Invariants
//! - Loading tolerates missing, unknown and ill-typed fields: each field
//!   falls back to its default independently.
//! - `update` never silently ignores a key: unknown keys and ill-typed values
//!   are errors, and nothing is written when validation fails.

use crate::model::note::NoteType;
use crate::storage::{save_json, KvStore, StorageError, SETTINGS_KEY};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DEFAULT_LANGUAGE: &str = "zh-CN";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// Editor font size in CSS pixels.
    pub fn css_px(self) -> u32 {
        match self {
            Self::Small => 14,
            Self::Medium => 16,
            Self::Large => 18,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorTheme {
    #[default]
    Default,
    Minimal,
    Focus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    CreatedAt,
    #[default]
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub is_dark_mode: bool,
    pub language: String,
    pub font_size: FontSize,
    pub auto_save: bool,
    pub auto_backup: bool,
    /// Hours between automatic backups.
    pub backup_interval: u32,
    pub show_line_numbers: bool,
    pub enable_markdown: bool,
    pub enable_spell_check: bool,
    pub enable_notifications: bool,
    pub sidebar_width: u32,
    pub note_list_width: u32,
    pub editor_theme: EditorTheme,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub default_note_type: NoteType,
    pub enable_word_wrap: bool,
    pub enable_auto_correct: bool,
    pub enable_rich_text: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_dark_mode: false,
            language: DEFAULT_LANGUAGE.to_string(),
            font_size: FontSize::Medium,
            auto_save: true,
            auto_backup: true,
            backup_interval: 24,
            show_line_numbers: false,
            enable_markdown: true,
            enable_spell_check: true,
            enable_notifications: true,
            sidebar_width: 320,
            note_list_width: 384,
            editor_theme: EditorTheme::Default,
            sort_by: SortBy::UpdatedAt,
            sort_order: SortOrder::Desc,
            default_note_type: NoteType::Text,
            enable_word_wrap: true,
            enable_auto_correct: true,
            enable_rich_text: true,
        }
    }
}

/// Closed set of recognized settings keys (camelCase on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    IsDarkMode,
    Language,
    FontSize,
    AutoSave,
    AutoBackup,
    BackupInterval,
    ShowLineNumbers,
    EnableMarkdown,
    EnableSpellCheck,
    EnableNotifications,
    SidebarWidth,
    NoteListWidth,
    EditorTheme,
    SortBy,
    SortOrder,
    DefaultNoteType,
    EnableWordWrap,
    EnableAutoCorrect,
    EnableRichText,
}

impl SettingKey {
    pub const ALL: [SettingKey; 19] = [
        Self::IsDarkMode,
        Self::Language,
        Self::FontSize,
        Self::AutoSave,
        Self::AutoBackup,
        Self::BackupInterval,
        Self::ShowLineNumbers,
        Self::EnableMarkdown,
        Self::EnableSpellCheck,
        Self::EnableNotifications,
        Self::SidebarWidth,
        Self::NoteListWidth,
        Self::EditorTheme,
        Self::SortBy,
        Self::SortOrder,
        Self::DefaultNoteType,
        Self::EnableWordWrap,
        Self::EnableAutoCorrect,
        Self::EnableRichText,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsDarkMode => "isDarkMode",
            Self::Language => "language",
            Self::FontSize => "fontSize",
            Self::AutoSave => "autoSave",
            Self::AutoBackup => "autoBackup",
            Self::BackupInterval => "backupInterval",
            Self::ShowLineNumbers => "showLineNumbers",
            Self::EnableMarkdown => "enableMarkdown",
            Self::EnableSpellCheck => "enableSpellCheck",
            Self::EnableNotifications => "enableNotifications",
            Self::SidebarWidth => "sidebarWidth",
            Self::NoteListWidth => "noteListWidth",
            Self::EditorTheme => "editorTheme",
            Self::SortBy => "sortBy",
            Self::SortOrder => "sortOrder",
            Self::DefaultNoteType => "defaultNoteType",
            Self::EnableWordWrap => "enableWordWrap",
            Self::EnableAutoCorrect => "enableAutoCorrect",
            Self::EnableRichText => "enableRichText",
        }
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| SettingsError::UnknownKey(value.to_string()))
    }
}

impl Display for SettingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum SettingsError {
    UnknownKey(String),
    InvalidValue { key: SettingKey, message: String },
    Storage(StorageError),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKey(key) => write!(f, "unknown setting `{key}`"),
            Self::InvalidValue { key, message } => {
                write!(f, "invalid value for setting `{key}`: {message}")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for SettingsError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeConfig {
    pub is_dark: bool,
    pub font_size: FontSize,
    pub theme: EditorTheme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    pub show_line_numbers: bool,
    pub enable_markdown: bool,
    pub enable_spell_check: bool,
    pub enable_word_wrap: bool,
    pub enable_auto_correct: bool,
    pub enable_rich_text: bool,
    pub theme: EditorTheme,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortConfig {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl Settings {
    /// Builds settings from a stored JSON object, field by field.
    pub fn from_value(value: &Value) -> Self {
        let mut settings = Self::default();
        let Some(fields) = value.as_object() else {
            warn!("event=settings_load module=settings status=degraded reason=not_an_object");
            return settings;
        };

        for (name, field) in fields {
            let Ok(key) = name.parse::<SettingKey>() else {
                continue;
            };
            if let Err(err) = settings.apply(key, field.clone()) {
                warn!("event=settings_load module=settings status=degraded key={key} error={err}");
            }
        }
        settings
    }

    /// Sets one field after validating the value against the key.
    pub fn apply(&mut self, key: SettingKey, value: Value) -> Result<(), SettingsError> {
        match key {
            SettingKey::IsDarkMode => self.is_dark_mode = typed(key, value)?,
            SettingKey::Language => {
                let language: String = typed(key, value)?;
                if language.trim().is_empty() {
                    return Err(invalid(key, "language must not be empty"));
                }
                self.language = language;
            }
            SettingKey::FontSize => self.font_size = typed(key, value)?,
            SettingKey::AutoSave => self.auto_save = typed(key, value)?,
            SettingKey::AutoBackup => self.auto_backup = typed(key, value)?,
            SettingKey::BackupInterval => self.backup_interval = positive(key, value)?,
            SettingKey::ShowLineNumbers => self.show_line_numbers = typed(key, value)?,
            SettingKey::EnableMarkdown => self.enable_markdown = typed(key, value)?,
            SettingKey::EnableSpellCheck => self.enable_spell_check = typed(key, value)?,
            SettingKey::EnableNotifications => self.enable_notifications = typed(key, value)?,
            SettingKey::SidebarWidth => self.sidebar_width = positive(key, value)?,
            SettingKey::NoteListWidth => self.note_list_width = positive(key, value)?,
            SettingKey::EditorTheme => self.editor_theme = typed(key, value)?,
            SettingKey::SortBy => self.sort_by = typed(key, value)?,
            SettingKey::SortOrder => self.sort_order = typed(key, value)?,
            SettingKey::DefaultNoteType => self.default_note_type = typed(key, value)?,
            SettingKey::EnableWordWrap => self.enable_word_wrap = typed(key, value)?,
            SettingKey::EnableAutoCorrect => self.enable_auto_correct = typed(key, value)?,
            SettingKey::EnableRichText => self.enable_rich_text = typed(key, value)?,
        }
        Ok(())
    }

    pub fn theme_config(&self) -> ThemeConfig {
        ThemeConfig {
            is_dark: self.is_dark_mode,
            font_size: self.font_size,
            theme: self.editor_theme,
        }
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            show_line_numbers: self.show_line_numbers,
            enable_markdown: self.enable_markdown,
            enable_spell_check: self.enable_spell_check,
            enable_word_wrap: self.enable_word_wrap,
            enable_auto_correct: self.enable_auto_correct,
            enable_rich_text: self.enable_rich_text,
            theme: self.editor_theme,
        }
    }

    pub fn sort_config(&self) -> SortConfig {
        SortConfig {
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

fn typed<T: DeserializeOwned>(key: SettingKey, value: Value) -> Result<T, SettingsError> {
    serde_json::from_value(value).map_err(|err| invalid(key, err.to_string()))
}

fn positive(key: SettingKey, value: Value) -> Result<u32, SettingsError> {
    match typed::<u32>(key, value)? {
        0 => Err(invalid(key, "must be greater than zero")),
        number => Ok(number),
    }
}

fn invalid(key: SettingKey, message: impl Into<String>) -> SettingsError {
    SettingsError::InvalidValue {
        key,
        message: message.into(),
    }
}

/// Settings bound to the key-value store they persist to.
pub struct SettingsStore<S: KvStore> {
    kv: S,
    settings: Settings,
}

impl<S: KvStore> SettingsStore<S> {
    /// Loads settings, falling back to defaults for anything unusable.
    pub fn open(kv: S) -> Result<Self, SettingsError> {
        let settings = match kv.get(SETTINGS_KEY)? {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => Settings::from_value(&value),
                Err(err) => {
                    warn!("event=settings_load module=settings status=degraded reason=corrupt error={err}");
                    Settings::default()
                }
            },
            None => Settings::default(),
        };
        info!("event=settings_load module=settings status=ok");
        Ok(Self { kv, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validates and applies one field, then persists the record.
    pub fn update(&mut self, key: SettingKey, value: Value) -> Result<(), SettingsError> {
        let mut next = self.settings.clone();
        next.apply(key, value)?;
        self.settings = next;
        self.save()
    }

    /// `update` keyed by the camelCase wire name.
    pub fn update_by_name(&mut self, name: &str, value: Value) -> Result<(), SettingsError> {
        let key = name.parse::<SettingKey>()?;
        self.update(key, value)
    }

    pub fn toggle_dark_mode(&mut self) -> Result<bool, SettingsError> {
        self.settings.is_dark_mode = !self.settings.is_dark_mode;
        self.save()?;
        Ok(self.settings.is_dark_mode)
    }

    pub fn set_language(&mut self, language: &str) -> Result<(), SettingsError> {
        self.update(SettingKey::Language, Value::String(language.to_string()))
    }

    pub fn set_font_size(&mut self, font_size: FontSize) -> Result<(), SettingsError> {
        self.settings.font_size = font_size;
        self.save()
    }

    pub fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = Settings::default();
        self.save()
    }

    pub fn save(&mut self) -> Result<(), SettingsError> {
        save_json(&mut self.kv, SETTINGS_KEY, &self.settings)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FontSize, SettingKey, Settings, SettingsError, SortBy};
    use serde_json::json;

    #[test]
    fn missing_and_invalid_fields_default_independently() {
        let settings = Settings::from_value(&json!({
            "isDarkMode": true,
            "fontSize": "gigantic",
            "sidebarWidth": 280,
            "somethingElse": 1
        }));
        assert!(settings.is_dark_mode);
        assert_eq!(settings.font_size, FontSize::Medium);
        assert_eq!(settings.sidebar_width, 280);
        assert_eq!(settings.note_list_width, 384);
    }

    #[test]
    fn apply_rejects_wrong_type_and_zero_width() {
        let mut settings = Settings::default();
        let err = settings
            .apply(SettingKey::AutoSave, json!("yes"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));

        let err = settings
            .apply(SettingKey::SidebarWidth, json!(0))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
        assert!(settings.auto_save);
    }

    #[test]
    fn keys_roundtrip_through_wire_names() {
        for key in SettingKey::ALL {
            assert_eq!(key.as_str().parse::<SettingKey>().unwrap(), key);
        }
        assert!(matches!(
            "colour".parse::<SettingKey>(),
            Err(SettingsError::UnknownKey(_))
        ));
    }

    #[test]
    fn wire_names_match_serialized_record() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), SettingKey::ALL.len());
        for key in SettingKey::ALL {
            assert!(object.contains_key(key.as_str()), "missing {key}");
        }
        assert_eq!(value["sortBy"], "updatedAt");
    }

    #[test]
    fn sort_by_parses_camel_case() {
        let mut settings = Settings::default();
        settings.apply(SettingKey::SortBy, json!("createdAt")).unwrap();
        assert_eq!(settings.sort_by, SortBy::CreatedAt);
    }
}
