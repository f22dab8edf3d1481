//! Export of single notes, full backups and backup import.
//!
//! # Invariants
//! - Export never mutates the store.
//! - Import is all-or-nothing: every incoming record is decoded and
//!   validated before the first one is appended.
//! - On id collisions the first record wins, including collisions inside one
//!   payload.

use super::{NotesStore, StoreError, StoreResult};
use crate::clock::format_date;
use crate::export::{
    render_note, BackupDocument, ExportError, ExportFormat, ExportOptions, FileSink,
    ImportPayload, ImportSummary, SavedFile, BACKUP_FORMAT_VERSION,
};
use crate::storage::KvStore;
use log::{info, warn};

const BACKUP_MIME_TYPE: &str = "application/json";

impl<S: KvStore> NotesStore<S> {
    /// Renders one note and hands it to `sink`. `Ok(false)` when missing.
    pub fn export_note(
        &self,
        id: &str,
        format: ExportFormat,
        options: &ExportOptions,
        sink: &mut dyn FileSink,
    ) -> Result<bool, ExportError> {
        let Some(note) = self.note(id) else {
            info!("event=note_export module=store status=skipped reason=not_found note_id={id}");
            return Ok(false);
        };

        let file = render_note(note, format, options, self.now())?;
        sink.save(&file)?;
        info!(
            "event=note_export module=store status=ok note_id={id} format={format} bytes={}",
            file.bytes.len()
        );
        Ok(true)
    }

    /// Saves the whole collection as `notes-backup-<date>.json`.
    pub fn export_data(&self, sink: &mut dyn FileSink) -> Result<SavedFile, ExportError> {
        let now = self.now();
        let document = BackupDocument {
            notes: &self.notes,
            folders: &self.folders,
            export_date: now,
            version: BACKUP_FORMAT_VERSION,
        };
        let bytes = serde_json::to_vec_pretty(&document).map_err(ExportError::Serialization)?;
        let file = SavedFile {
            filename: format!("notes-backup-{}.json", format_date(&now)),
            mime_type: BACKUP_MIME_TYPE.to_string(),
            bytes,
        };
        sink.save(&file)?;
        info!(
            "event=backup_export module=store status=ok notes={} folders={} bytes={}",
            self.notes.len(),
            self.folders.len(),
            file.bytes.len()
        );
        Ok(file)
    }

    /// Merges a backup into the collection, skipping ids already present.
    pub fn import_data(&mut self, payload: impl Into<ImportPayload>) -> StoreResult<ImportSummary> {
        let records = payload.into().decode().map_err(|message| {
            warn!("event=backup_import module=store status=rejected reason=decode");
            StoreError::MalformedImport(message)
        })?;

        for note in records.notes() {
            note.validate().map_err(|err| {
                warn!("event=backup_import module=store status=rejected reason=invalid_note");
                StoreError::MalformedImport(err.to_string())
            })?;
        }
        for folder in records.folders() {
            folder.validate().map_err(|err| {
                warn!("event=backup_import module=store status=rejected reason=invalid_folder");
                StoreError::MalformedImport(err.to_string())
            })?;
        }

        let now = self.now();
        let (notes, folders) = records.into_parts();
        let (mut note_ids, mut folder_ids) = self.known_ids();
        let mut summary = ImportSummary::default();

        for folder in folders {
            if folder_ids.insert(folder.id.clone()) {
                self.folders.push(folder);
                summary.folders_added += 1;
            } else {
                summary.folders_skipped += 1;
            }
        }
        for note in notes {
            if !note_ids.insert(note.id.clone()) {
                summary.notes_skipped += 1;
                continue;
            }
            if let Some(reminder) = &note.reminder {
                self.reminders.schedule(&note.id, reminder.datetime, now);
            }
            self.notes.push(note);
            summary.notes_added += 1;
        }

        info!(
            "event=backup_import module=store status=ok notes_added={} notes_skipped={} folders_added={} folders_skipped={}",
            summary.notes_added,
            summary.notes_skipped,
            summary.folders_added,
            summary.folders_skipped
        );
        self.flush()?;
        Ok(summary)
    }
}
