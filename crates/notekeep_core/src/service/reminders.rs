//! Reminder state on notes and the timers that fire them.
//!
//! # Invariants
//! - A note has a pending timer only while its reminder is in the future
//!   and has not fired yet.
//! - Changing, clearing or deleting a reminder cancels its previous timer.

use super::{NotesStore, StoreResult};
use crate::model::note::{Note, Reminder};
use crate::reminder::{Alert, AlertSink, TimerHandle};
use crate::storage::KvStore;
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Characters of note content used when a reminder has no message.
const ALERT_BODY_CHARS: usize = 100;

impl<S: KvStore> NotesStore<S> {
    /// Stores or clears a note's reminder and reschedules its timer.
    pub fn set_reminder(&mut self, id: &str, reminder: Option<Reminder>) -> StoreResult<()> {
        let now = self.now();
        let Some(note) = self.note_mut(id) else {
            debug!("event=reminder_set module=store status=skipped reason=not_found note_id={id}");
            return Ok(());
        };
        note.reminder = reminder;
        note.touch(now);

        let due = note.reminder.as_ref().map(|reminder| reminder.datetime);
        let handle = match due {
            Some(due) => self.reminders.schedule(id, due, now),
            None => {
                self.reminders.cancel_note(id);
                None
            }
        };
        info!(
            "event=reminder_set module=store status=ok note_id={id} cleared={} scheduled={}",
            due.is_none(),
            handle.is_some()
        );
        self.flush()
    }

    /// Fires every timer due at the current instant. Returns how many fired.
    pub fn run_due_reminders(&mut self, sink: &mut dyn AlertSink) -> usize {
        let now = self.now();
        let due = self.reminders.take_due(now);
        let mut fired = 0;
        for timer in due {
            let Some(note) = self.note(&timer.note_id) else {
                continue;
            };
            sink.alert(&reminder_alert(note));
            fired += 1;
            debug!(
                "event=reminder_fire module=store status=ok note_id={}",
                timer.note_id
            );
        }
        fired
    }

    /// Alerts every reminder that is due but never fired in this session,
    /// such as one that elapsed while no host was running.
    ///
    /// Returns how many alerts were sent. Each note alerts at most once
    /// until its reminder changes.
    pub fn alert_missed_reminders(&mut self, sink: &mut dyn AlertSink) -> usize {
        let now = self.now();
        let missed: Vec<&Note> = self
            .notes
            .iter()
            .filter(|note| {
                note.reminder
                    .as_ref()
                    .map_or(false, |reminder| reminder.datetime <= now)
            })
            .filter(|note| {
                self.reminders.pending_for(&note.id).is_none()
                    && !self.reminders.has_fired(&note.id)
            })
            .collect();

        let mut alerted = Vec::with_capacity(missed.len());
        for note in missed {
            sink.alert(&reminder_alert(note));
            alerted.push(note.id.clone());
        }
        for id in &alerted {
            self.reminders.mark_fired(id);
            debug!("event=reminder_fire module=store status=ok reason=missed note_id={id}");
        }
        alerted.len()
    }

    /// Clears every reminder strictly before now and flushes once.
    ///
    /// Returns how many reminders were cleared.
    pub fn cleanup_expired_reminders(&mut self) -> StoreResult<usize> {
        let now = self.now();
        let mut cleared = Vec::new();
        for note in &mut self.notes {
            let expired = note
                .reminder
                .as_ref()
                .map_or(false, |reminder| reminder.datetime < now);
            if expired {
                note.reminder = None;
                note.touch(now);
                cleared.push(note.id.clone());
            }
        }
        for id in &cleared {
            self.reminders.cancel_note(id);
        }
        info!(
            "event=reminder_cleanup module=store status=ok cleared={}",
            cleared.len()
        );
        self.flush()?;
        Ok(cleared.len())
    }

    /// Earliest pending timer, for hosts that sleep until the next alert.
    pub fn next_reminder_due(&self) -> Option<DateTime<Utc>> {
        self.reminders.next_due()
    }

    pub fn pending_reminder(&self, id: &str) -> Option<TimerHandle> {
        self.reminders.pending_for(id)
    }

    /// Schedules timers for every stored reminder. Returns how many are pending.
    pub(super) fn schedule_all_reminders(&mut self) -> usize {
        let now = self.now();
        self.reminders.clear();
        for note in &self.notes {
            if let Some(reminder) = &note.reminder {
                self.reminders.schedule(&note.id, reminder.datetime, now);
            }
        }
        self.reminders.pending_count()
    }
}

fn reminder_alert(note: &Note) -> Alert {
    let message = note
        .reminder
        .as_ref()
        .and_then(|reminder| reminder.message.as_deref())
        .filter(|message| !message.trim().is_empty());
    let body = match message {
        Some(message) => message.to_string(),
        None if note.is_encrypted => String::new(),
        None => note.content.chars().take(ALERT_BODY_CHARS).collect(),
    };

    Alert {
        title: format!("Reminder: {}", note.title),
        body,
        tag: note.id.clone(),
    }
}
