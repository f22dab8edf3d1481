//! Notes store use-cases.
//!
//! # Responsibility
//! - Own the in-memory note/folder collection and the UI selection state.
//! - Flush the collection through `KvStore` after every mutation.
//! - Coordinate encryption, reminder timers and export around mutations.
//!
//! # Invariants
//! - Lookup misses are silent no-ops, never errors.
//! - A failed flush is returned as `StoreError::Persistence`; the in-memory
//!   change stays applied and the next successful flush persists it.
//! - Logs carry ids and counts only, never titles, content or passwords.

mod encryption;
mod notes_store;
mod reminders;
mod transfer;

pub use notes_store::NotesStore;

use crate::crypto::CryptoError;
use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for note use-cases.
#[derive(Debug)]
pub enum StoreError {
    /// The collection could not be loaded or flushed.
    Persistence(StorageError),
    /// Import payload is not JSON or has the wrong shape. Message is user-facing.
    MalformedImport(String),
    /// Tag input is blank after trimming.
    InvalidTag(String),
    /// Sealing note content failed.
    Encryption(CryptoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "failed to persist notes: {err}"),
            Self::MalformedImport(message) => write!(f, "import failed: {message}"),
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::Encryption(err) => write!(f, "failed to encrypt note: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            Self::Encryption(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Persistence(value)
    }
}

impl From<CryptoError> for StoreError {
    fn from(value: CryptoError) -> Self {
        Self::Encryption(value)
    }
}
