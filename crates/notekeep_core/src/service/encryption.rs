//! Password lock/unlock of note content.
//!
//! A wrong password or an unreadable envelope is a `false` result, never an
//! error, and leaves the note untouched.

use super::{NotesStore, StoreResult};
use crate::crypto::{self, password_check};
use crate::storage::KvStore;
use log::{debug, info, warn};

impl<S: KvStore> NotesStore<S> {
    /// Seals the content of an unlocked note with `password`.
    ///
    /// No-op for missing or already locked notes. Content history is kept
    /// as-is; only the current content is sealed.
    pub fn encrypt_note(&mut self, id: &str, password: &str) -> StoreResult<()> {
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            debug!("event=note_encrypt module=store status=skipped reason=not_found note_id={id}");
            return Ok(());
        };
        if note.is_encrypted {
            debug!("event=note_encrypt module=store status=skipped reason=already_encrypted note_id={id}");
            return Ok(());
        }

        note.content = crypto::encrypt(&note.content, password)?;
        note.is_encrypted = true;
        note.password_check = Some(password_check(password));
        note.touch(now);
        info!("event=note_encrypt module=store status=ok note_id={id}");
        self.flush()
    }

    /// Restores plaintext when `password` matches. Returns whether it did.
    pub fn decrypt_note(&mut self, id: &str, password: &str) -> StoreResult<bool> {
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            return Ok(false);
        };
        if !note.is_encrypted {
            return Ok(false);
        }
        if note.password_check.as_deref() != Some(password_check(password).as_str()) {
            info!("event=note_decrypt module=store status=rejected reason=password_mismatch note_id={id}");
            return Ok(false);
        }

        let plaintext = match crypto::decrypt(&note.content, password) {
            Ok(plaintext) => plaintext,
            Err(err) => {
                warn!("event=note_decrypt module=store status=rejected reason=unreadable note_id={id} error={err}");
                return Ok(false);
            }
        };
        note.content = plaintext;
        note.is_encrypted = false;
        note.password_check = None;
        note.touch(now);
        info!("event=note_decrypt module=store status=ok note_id={id}");
        self.flush()?;
        Ok(true)
    }
}
