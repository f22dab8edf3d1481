//! Core domain logic for NoteKeep.
//! This crate is the single source of truth for note, folder and settings
//! invariants; hosts render its state and call its operations.

pub mod clock;
pub mod crypto;
pub mod db;
pub mod export;
pub mod ids;
pub mod logging;
pub mod model;
pub mod notify;
pub mod reminder;
pub mod service;
pub mod settings;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use export::{
    DirectorySink, ExportError, ExportFormat, ExportOptions, FileSink, ImportPayload,
    ImportSummary, SavedFile,
};
pub use logging::{default_log_level, init_logging, logging_status, resolve_log_level};
pub use model::folder::{Folder, FolderPatch, NewFolder};
pub use model::note::{
    ChecklistItem, HistoryEntry, NewNote, Note, NotePatch, NoteType, Reminder,
};
pub use model::ValidationError;
pub use notify::{Notification, NotificationCenter, NotificationKind};
pub use reminder::{Alert, AlertSink};
pub use service::{NotesStore, StoreError, StoreResult};
pub use settings::{Settings, SettingsError, SettingsStore};
pub use storage::{KvStore, MemoryKvStore, SqliteKvStore, StorageError};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
