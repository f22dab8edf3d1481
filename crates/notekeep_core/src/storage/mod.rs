//! Persistence gateway over a local key-value store.
//!
//! # Responsibility
//! - Define the `KvStore` contract the store flushes through.
//! - Own the persisted record layouts and their JSON encoding.
//!
//! # Invariants
//! - Notes/folders and settings live under two independent keys.
//! - Records are stored as whole JSON documents; there is no schema migration
//!   of record contents, only missing-field tolerance on load.

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

use crate::db::DbError;
use crate::model::folder::Folder;
use crate::model::note::Note;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key holding `{notes, folders, lastSaved}`.
pub const NOTES_DATA_KEY: &str = "notekeep-data";
/// Key holding the settings record.
pub const SETTINGS_KEY: &str = "notekeep-settings";

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    /// SQLite backend failure.
    Db(DbError),
    /// Writing would exceed the backend's byte quota.
    QuotaExceeded { key: String, limit: usize, needed: usize },
    /// A record could not be encoded.
    Serialization(serde_json::Error),
    /// A stored record could not be decoded.
    Corrupt { key: String, source: serde_json::Error },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded { key, limit, needed } => write!(
                f,
                "storage quota exceeded writing `{key}`: {needed} bytes needed, limit {limit}"
            ),
            Self::Serialization(err) => write!(f, "failed to encode record: {err}"),
            Self::Corrupt { key, source } => write!(f, "stored record `{key}` is corrupt: {source}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } => None,
            Self::Serialization(err) => Some(err),
            Self::Corrupt { source, .. } => Some(source),
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Local string key-value store.
pub trait KvStore {
    /// Reads one value; `None` when the key was never written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Writes one value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
}

/// Persisted layout of the notes/folders record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCollection {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub last_saved: Option<DateTime<Utc>>,
}

/// Borrowed form of `PersistedCollection` written on every flush.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot<'a> {
    pub notes: &'a [Note],
    pub folders: &'a [Folder],
    pub last_saved: DateTime<Utc>,
}

/// Decodes the JSON document under `key`.
pub fn load_json<T: DeserializeOwned>(kv: &impl KvStore, key: &str) -> StorageResult<Option<T>> {
    let Some(raw) = kv.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
}

/// Encodes `value` as JSON and writes it under `key`.
pub fn save_json<T: Serialize>(kv: &mut impl KvStore, key: &str, value: &T) -> StorageResult<()> {
    let raw = serde_json::to_string(value).map_err(StorageError::Serialization)?;
    kv.set(key, &raw)
}
