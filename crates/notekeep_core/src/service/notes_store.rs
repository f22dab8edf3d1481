//! Note/folder repository with flush-on-write persistence.
//!
//! # Invariants
//! - Every mutating call that changed something flushes exactly once.
//! - Derived views are recomputed on each call and never stored.
//! - Selection setters never flush.

use super::{StoreError, StoreResult};
use crate::clock::Clock;
use crate::ids::generate_id;
use crate::model::folder::{Folder, FolderId, FolderPatch, NewFolder};
use crate::model::note::{
    normalize_tag, normalize_tags, ChecklistItem, HistoryEntry, NewNote, Note, NoteId, NotePatch,
    NoteType,
};
use crate::reminder::ReminderScheduler;
use crate::settings::{SortBy, SortConfig, SortOrder};
use crate::storage::{
    load_json, save_json, CollectionSnapshot, KvStore, PersistedCollection, StorageError,
    NOTES_DATA_KEY,
};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Number of notes returned by `recent_notes`.
const RECENT_NOTES_LIMIT: usize = 10;
const COPY_SUFFIX: &str = " copy";

/// Single source of truth for notes, folders and the current selection.
pub struct NotesStore<S: KvStore> {
    pub(super) kv: S,
    pub(super) clock: Box<dyn Clock>,
    pub(super) notes: Vec<Note>,
    pub(super) folders: Vec<Folder>,
    pub(super) reminders: ReminderScheduler,
    last_saved: Option<DateTime<Utc>>,
    current_note: Option<NoteId>,
    current_folder: Option<FolderId>,
    search_query: String,
}

impl<S: KvStore> NotesStore<S> {
    /// Loads the persisted collection and schedules pending reminders.
    ///
    /// A corrupt record is logged and replaced by an empty collection on the
    /// next flush; backend failures are returned.
    pub fn open(kv: S, clock: Box<dyn Clock>) -> StoreResult<Self> {
        let loaded = match load_json::<PersistedCollection>(&kv, NOTES_DATA_KEY) {
            Ok(found) => found,
            Err(StorageError::Corrupt { key, source }) => {
                warn!("event=store_open module=store status=degraded reason=corrupt_record key={key} error={source}");
                None
            }
            Err(err) => {
                error!("event=store_open module=store status=error error={err}");
                return Err(err.into());
            }
        };

        let (notes, folders, last_saved) = loaded
            .map(|collection| (collection.notes, collection.folders, collection.last_saved))
            .unwrap_or_default();
        for note in &notes {
            if let Err(err) = note.validate() {
                warn!("event=store_open module=store status=degraded note_id={} error={err}", note.id);
            }
        }

        let mut store = Self {
            kv,
            clock,
            notes,
            folders,
            reminders: ReminderScheduler::new(),
            last_saved,
            current_note: None,
            current_folder: None,
            search_query: String::new(),
        };
        let scheduled = store.schedule_all_reminders();
        info!(
            "event=store_open module=store status=ok notes={} folders={} reminders={scheduled}",
            store.notes.len(),
            store.folders.len()
        );
        Ok(store)
    }

    /// Creates a note with defaults for any missing initial field.
    ///
    /// The note is in the collection even when the flush fails.
    pub fn create_note(&mut self, folder_id: Option<String>, init: NewNote) -> StoreResult<Note> {
        let note = Note::new(generate_id(), init, folder_id, self.now());
        self.notes.push(note.clone());
        info!("event=note_create module=store status=ok note_id={}", note.id);
        self.flush()?;
        Ok(note)
    }

    /// Applies a partial update. Content changes are versioned first and are
    /// skipped on encrypted notes.
    pub fn update_note(&mut self, id: &str, patch: NotePatch) -> StoreResult<()> {
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            debug!("event=note_update module=store status=skipped reason=not_found note_id={id}");
            return Ok(());
        };

        let NotePatch {
            title,
            content,
            folder_id,
            is_pinned,
            attachments,
            tags,
            kind,
            checklist,
        } = patch;

        let content = match content {
            Some(_) if note.is_encrypted => {
                debug!("event=note_update module=store status=skipped reason=locked field=content note_id={id}");
                None
            }
            content => content,
        };
        let versioned = content.map_or(false, |content| note.replace_content(content, now));
        if let Some(title) = title {
            note.title = title;
        }
        if let Some(folder_id) = folder_id {
            note.folder_id = folder_id;
        }
        if let Some(is_pinned) = is_pinned {
            note.is_pinned = is_pinned;
        }
        if let Some(attachments) = attachments {
            note.attachments = attachments;
        }
        if let Some(tags) = tags {
            note.tags = normalize_tags(&tags);
        }
        if let Some(checklist) = checklist {
            note.replace_checklist(checklist);
        }
        if let Some(kind) = kind {
            note.kind = kind;
        }
        note.touch(now);
        debug!(
            "event=note_update module=store status=ok note_id={id} versioned={versioned} version={}",
            note.version
        );
        self.flush()
    }

    /// Removes a note and cancels its reminder. Returns whether it existed.
    pub fn delete_note(&mut self, id: &str) -> StoreResult<bool> {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        if self.notes.len() == before {
            debug!("event=note_delete module=store status=skipped reason=not_found note_id={id}");
            return Ok(false);
        }

        let cancelled = self.reminders.cancel_note(id);
        if self.current_note.as_deref() == Some(id) {
            self.current_note = None;
        }
        info!("event=note_delete module=store status=ok note_id={id} timer_cancelled={cancelled}");
        self.flush()?;
        Ok(true)
    }

    /// Copies a note under a new id with a `" copy"` title suffix.
    pub fn duplicate_note(&mut self, id: &str) -> StoreResult<Option<Note>> {
        let now = self.now();
        let Some(source) = self.note(id) else {
            debug!("event=note_duplicate module=store status=skipped reason=not_found note_id={id}");
            return Ok(None);
        };

        let mut copy = source.clone();
        copy.id = generate_id();
        copy.title.push_str(COPY_SUFFIX);
        copy.created_at = now;
        copy.updated_at = now;
        copy.is_pinned = false;
        copy.history.clear();

        if let Some(reminder) = &copy.reminder {
            self.reminders.schedule(&copy.id, reminder.datetime, now);
        }
        self.notes.push(copy.clone());
        info!(
            "event=note_duplicate module=store status=ok source_id={id} note_id={}",
            copy.id
        );
        self.flush()?;
        Ok(Some(copy))
    }

    pub fn toggle_pin(&mut self, id: &str) -> StoreResult<()> {
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            return Ok(());
        };
        note.is_pinned = !note.is_pinned;
        note.touch(now);
        self.flush()
    }

    pub fn create_folder(&mut self, init: NewFolder) -> StoreResult<Folder> {
        let folder = Folder::new(generate_id(), init, self.now());
        self.folders.push(folder.clone());
        info!("event=folder_create module=store status=ok folder_id={}", folder.id);
        self.flush()?;
        Ok(folder)
    }

    pub fn update_folder(&mut self, id: &str, patch: FolderPatch) -> StoreResult<()> {
        let now = self.now();
        let Some(folder) = self.folders.iter_mut().find(|folder| folder.id == id) else {
            debug!("event=folder_update module=store status=skipped reason=not_found folder_id={id}");
            return Ok(());
        };
        if let Some(name) = patch.name {
            folder.name = name;
        }
        if let Some(color) = patch.color {
            folder.color = color;
        }
        if let Some(icon) = patch.icon {
            folder.icon = icon;
        }
        folder.touch(now);
        self.flush()
    }

    /// Removes a folder after moving its notes out of it.
    ///
    /// Returns whether a folder was removed. Dangling references to a folder
    /// that no longer exists are still cleared and flushed.
    pub fn delete_folder(&mut self, id: &str) -> StoreResult<bool> {
        let mut detached = 0;
        for note in self
            .notes
            .iter_mut()
            .filter(|note| note.folder_id.as_deref() == Some(id))
        {
            note.folder_id = None;
            detached += 1;
        }

        let before = self.folders.len();
        self.folders.retain(|folder| folder.id != id);
        let removed = self.folders.len() != before;
        if self.current_folder.as_deref() == Some(id) {
            self.current_folder = None;
        }

        if !removed && detached == 0 {
            debug!("event=folder_delete module=store status=skipped reason=not_found folder_id={id}");
            return Ok(false);
        }
        info!("event=folder_delete module=store status=ok folder_id={id} removed={removed} detached={detached}");
        self.flush()?;
        Ok(removed)
    }

    /// Replaces the checklist; repeated item ids keep their first occurrence.
    pub fn update_checklist(&mut self, id: &str, items: Vec<ChecklistItem>) -> StoreResult<()> {
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            return Ok(());
        };
        let dropped = note.set_checklist(items);
        note.touch(now);
        if dropped > 0 {
            warn!("event=checklist_update module=store status=degraded note_id={id} dropped_duplicates={dropped}");
        }
        self.flush()
    }

    pub fn add_checklist_item(
        &mut self,
        id: &str,
        text: impl Into<String>,
    ) -> StoreResult<Option<ChecklistItem>> {
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            return Ok(None);
        };

        let mut item = ChecklistItem::new(text, now);
        while note.checklist.iter().any(|existing| existing.id == item.id) {
            item.id = generate_id();
        }
        note.checklist.push(item.clone());
        note.kind = NoteType::Checklist;
        note.touch(now);
        self.flush()?;
        Ok(Some(item))
    }

    /// Flips one item's completion. No-op when the note or item is missing.
    pub fn toggle_checklist_item(&mut self, id: &str, item_id: &str) -> StoreResult<()> {
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            return Ok(());
        };
        let Some(item) = note.checklist.iter_mut().find(|item| item.id == item_id) else {
            return Ok(());
        };
        item.completed = !item.completed;
        note.kind = NoteType::Checklist;
        note.touch(now);
        self.flush()
    }

    /// Replaces the full tag set. Blank tags are rejected before any change.
    pub fn set_tags<T: AsRef<str>>(&mut self, id: &str, tags: &[T]) -> StoreResult<()> {
        if let Some(blank) = tags.iter().find(|tag| tag.as_ref().trim().is_empty()) {
            return Err(StoreError::InvalidTag(blank.as_ref().to_string()));
        }
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            return Ok(());
        };
        note.tags = normalize_tags(tags);
        note.touch(now);
        self.flush()
    }

    pub fn add_tag(&mut self, id: &str, tag: &str) -> StoreResult<()> {
        let normalized = normalize_tag(tag).ok_or_else(|| StoreError::InvalidTag(tag.to_string()))?;
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            return Ok(());
        };
        if !note.tags.insert(normalized) {
            return Ok(());
        }
        note.touch(now);
        self.flush()
    }

    pub fn remove_tag(&mut self, id: &str, tag: &str) -> StoreResult<()> {
        let normalized = normalize_tag(tag).ok_or_else(|| StoreError::InvalidTag(tag.to_string()))?;
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            return Ok(());
        };
        if !note.tags.remove(&normalized) {
            return Ok(());
        }
        note.touch(now);
        self.flush()
    }

    /// Every tag in use, sorted and deduplicated.
    pub fn all_tags(&self) -> Vec<String> {
        self.notes
            .iter()
            .flat_map(|note| note.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Notes carrying `tag`, pinned first then most recently updated.
    pub fn notes_with_tag(&self, tag: &str) -> Vec<&Note> {
        let Some(tag) = normalize_tag(tag) else {
            return Vec::new();
        };
        let mut notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|note| note.tags.contains(&tag))
            .collect();
        notes.sort_by(|a, b| compare_notes(a, b, SortConfig::default()));
        notes
    }

    /// Notes in the current folder matching the search query, pinned first
    /// then most recently updated.
    pub fn filtered_notes(&self) -> Vec<&Note> {
        self.sorted_notes(SortConfig::default())
    }

    /// Same selection as `filtered_notes`, ordered by `config` within the
    /// pinned and unpinned groups.
    pub fn sorted_notes(&self, config: SortConfig) -> Vec<&Note> {
        let needle = self.search_query.to_lowercase();
        let mut notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|note| match &self.current_folder {
                Some(folder_id) => note.folder_id.as_ref() == Some(folder_id),
                None => true,
            })
            .filter(|note| needle.is_empty() || note.matches_query(&needle))
            .collect();
        notes.sort_by(|a, b| compare_notes(a, b, config));
        notes
    }

    /// Pinned notes in collection order.
    pub fn pinned_notes(&self) -> Vec<&Note> {
        self.notes.iter().filter(|note| note.is_pinned).collect()
    }

    /// The ten most recently updated notes, ignoring folder and search.
    pub fn recent_notes(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        notes.truncate(RECENT_NOTES_LIMIT);
        notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.id == id)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Replaced content versions of one note, oldest first.
    pub fn note_history(&self, id: &str) -> Option<&[HistoryEntry]> {
        self.note(id).map(|note| note.history.as_slice())
    }

    pub fn set_current_note(&mut self, id: Option<String>) {
        self.current_note = id;
    }

    pub fn current_note_id(&self) -> Option<&str> {
        self.current_note.as_deref()
    }

    pub fn current_note(&self) -> Option<&Note> {
        self.current_note.as_deref().and_then(|id| self.note(id))
    }

    pub fn set_current_folder(&mut self, id: Option<String>) {
        self.current_folder = id;
    }

    pub fn current_folder_id(&self) -> Option<&str> {
        self.current_folder.as_deref()
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Instant of the last successful flush, or of the loaded record.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    /// Writes the whole collection under `NOTES_DATA_KEY`.
    pub fn flush(&mut self) -> StoreResult<()> {
        let now = self.now();
        let snapshot = CollectionSnapshot {
            notes: &self.notes,
            folders: &self.folders,
            last_saved: now,
        };
        match save_json(&mut self.kv, NOTES_DATA_KEY, &snapshot) {
            Ok(()) => {
                self.last_saved = Some(now);
                debug!(
                    "event=store_flush module=store status=ok notes={} folders={}",
                    self.notes.len(),
                    self.folders.len()
                );
                Ok(())
            }
            Err(err) => {
                error!("event=store_flush module=store status=error error={err}");
                Err(err.into())
            }
        }
    }

    pub(super) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(super) fn note_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|note| note.id == id)
    }

    /// Ids present in the collection, for merge bookkeeping.
    pub(super) fn known_ids(&self) -> (HashSet<String>, HashSet<String>) {
        (
            self.notes.iter().map(|note| note.id.clone()).collect(),
            self.folders.iter().map(|folder| folder.id.clone()).collect(),
        )
    }
}

/// Pinned first, then `config` order; ties keep collection order.
fn compare_notes(a: &Note, b: &Note, config: SortConfig) -> Ordering {
    b.is_pinned.cmp(&a.is_pinned).then_with(|| {
        let ordering = match config.sort_by {
            SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            SortBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        match config.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::NotesStore;
    use crate::clock::ManualClock;
    use crate::model::note::NewNote;
    use crate::settings::{SortBy, SortConfig, SortOrder};
    use crate::storage::MemoryKvStore;
    use chrono::{Duration, TimeZone, Utc};

    fn store() -> (NotesStore<MemoryKvStore>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
        let store = NotesStore::open(MemoryKvStore::new(), Box::new(clock.clone())).unwrap();
        (store, clock)
    }

    #[test]
    fn sorted_notes_keeps_pinned_group_first() {
        let (mut store, clock) = store();
        let zeta = store.create_note(None, NewNote::titled("zeta")).unwrap();
        clock.advance(Duration::minutes(1));
        let alpha = store.create_note(None, NewNote::titled("Alpha")).unwrap();
        clock.advance(Duration::minutes(1));
        let mid = store.create_note(None, NewNote::titled("mid")).unwrap();
        store.toggle_pin(&mid.id).unwrap();

        let by_title = SortConfig {
            sort_by: SortBy::Title,
            sort_order: SortOrder::Asc,
        };
        let ids: Vec<_> = store
            .sorted_notes(by_title)
            .into_iter()
            .map(|note| note.id.as_str())
            .collect();
        assert_eq!(ids, vec![mid.id.as_str(), alpha.id.as_str(), zeta.id.as_str()]);
    }

    #[test]
    fn recent_notes_caps_at_ten_newest() {
        let (mut store, clock) = store();
        for idx in 0..12 {
            store
                .create_note(None, NewNote::titled(format!("n{idx}")))
                .unwrap();
            clock.advance(Duration::seconds(1));
        }
        let recent = store.recent_notes();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].title, "n11");
        assert_eq!(recent[9].title, "n2");
    }

    #[test]
    fn selection_setters_do_not_flush() {
        let (mut store, _clock) = store();
        store.set_search_query("x");
        store.set_current_folder(Some("f".to_string()));
        store.set_current_note(Some("n".to_string()));
        assert!(store.last_saved().is_none());
        assert!(store.current_note().is_none());
        assert_eq!(store.current_note_id(), Some("n"));
    }
}
