//! Cooperative one-shot timer queue for note reminders.
//!
//! # Responsibility
//! - Track at most one pending timer per note.
//! - Hand back timers whose due time has passed when the host polls.
//!
//! # Invariants
//! - A timer is only created for a due time strictly after `now`.
//! - Scheduling a note again cancels its previous timer.
//! - A cancelled timer never fires.
//! - Due timers are returned in due-time order, ties broken by schedule order.
//! - A note is marked fired once its timer is taken, until it is scheduled
//!   or cancelled again.

use chrono::{DateTime, Utc};
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Cancellation handle for one scheduled reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Timer that reached its due time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub handle: TimerHandle,
    pub note_id: String,
    pub due: DateTime<Utc>,
}

/// Alert emitted when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    /// Note id, so repeated alerts for one note can be coalesced.
    pub tag: String,
}

/// Receiver of local alerts.
pub trait AlertSink {
    fn alert(&mut self, alert: &Alert);
}

impl AlertSink for Vec<Alert> {
    fn alert(&mut self, alert: &Alert) {
        self.push(alert.clone());
    }
}

#[derive(Debug, Default)]
pub struct ReminderScheduler {
    next_handle: u64,
    queue: BTreeMap<(DateTime<Utc>, TimerHandle), String>,
    by_note: HashMap<String, (DateTime<Utc>, TimerHandle)>,
    fired: HashSet<String>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a reminder for `note_id`, replacing any pending one.
    ///
    /// Returns `None` (and leaves nothing pending for the note) when `due`
    /// is not in the future.
    pub fn schedule(
        &mut self,
        note_id: &str,
        due: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<TimerHandle> {
        self.cancel_note(note_id);
        if due <= now {
            debug!("event=reminder_schedule module=reminder status=skipped reason=elapsed note_id={note_id}");
            return None;
        }

        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.queue.insert((due, handle), note_id.to_string());
        self.by_note.insert(note_id.to_string(), (due, handle));
        debug!(
            "event=reminder_schedule module=reminder status=ok note_id={note_id} delay_ms={}",
            (due - now).num_milliseconds()
        );
        Some(handle)
    }

    /// Cancels the pending timer of one note. Returns whether one existed.
    pub fn cancel_note(&mut self, note_id: &str) -> bool {
        self.fired.remove(note_id);
        match self.by_note.remove(note_id) {
            Some(key) => {
                self.queue.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Cancels one timer by handle. Returns whether it was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let key = self
            .queue
            .keys()
            .find(|(_, pending)| *pending == handle)
            .copied();
        let Some(key) = key else {
            return false;
        };
        if let Some(note_id) = self.queue.remove(&key) {
            self.by_note.remove(&note_id);
        }
        true
    }

    /// Drops every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.by_note.clear();
        self.fired.clear();
    }

    /// Removes and returns every timer due at or before `now`.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<DueReminder> {
        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            let (when, handle) = *entry.key();
            if when > now {
                break;
            }
            let note_id = entry.remove();
            self.by_note.remove(&note_id);
            self.fired.insert(note_id.clone());
            due.push(DueReminder {
                handle,
                note_id,
                due: when,
            });
        }
        due
    }

    pub fn pending_for(&self, note_id: &str) -> Option<TimerHandle> {
        self.by_note.get(note_id).map(|(_, handle)| *handle)
    }

    /// Records an alert delivered outside the timer queue.
    pub fn mark_fired(&mut self, note_id: &str) {
        self.fired.insert(note_id.to_string());
    }

    pub fn has_fired(&self, note_id: &str) -> bool {
        self.fired.contains(note_id)
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Earliest pending due time, for hosts that sleep until the next alert.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.keys().next().map(|(when, _)| *when)
    }
}

#[cfg(test)]
mod tests {
    use super::ReminderScheduler;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn elapsed_due_time_schedules_nothing() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut scheduler = ReminderScheduler::new();
        assert!(scheduler.schedule("n1", now, now).is_none());
        assert!(scheduler
            .schedule("n1", now - Duration::seconds(1), now)
            .is_none());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn rescheduling_replaces_previous_timer() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut scheduler = ReminderScheduler::new();
        let first = scheduler
            .schedule("n1", now + Duration::minutes(5), now)
            .unwrap();
        let second = scheduler
            .schedule("n1", now + Duration::minutes(10), now)
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.pending_for("n1"), Some(second));
        assert!(scheduler.take_due(now + Duration::minutes(6)).is_empty());
        assert_eq!(scheduler.take_due(now + Duration::minutes(10)).len(), 1);
    }

    #[test]
    fn take_due_returns_in_due_order_and_leaves_future_timers() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut scheduler = ReminderScheduler::new();
        scheduler.schedule("late", now + Duration::minutes(3), now);
        scheduler.schedule("early", now + Duration::minutes(1), now);
        scheduler.schedule("future", now + Duration::hours(1), now);

        let due = scheduler.take_due(now + Duration::minutes(5));
        let ids: Vec<_> = due.iter().map(|reminder| reminder.note_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(scheduler.next_due(), Some(now + Duration::hours(1)));
    }

    #[test]
    fn cancel_by_handle_prevents_firing() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut scheduler = ReminderScheduler::new();
        let handle = scheduler
            .schedule("n1", now + Duration::minutes(1), now)
            .unwrap();

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert!(scheduler.pending_for("n1").is_none());
        assert!(scheduler.take_due(now + Duration::hours(1)).is_empty());
    }

    #[test]
    fn fired_mark_resets_on_reschedule() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut scheduler = ReminderScheduler::new();
        scheduler.schedule("n1", now + Duration::minutes(1), now);
        assert!(!scheduler.has_fired("n1"));

        scheduler.take_due(now + Duration::minutes(1));
        assert!(scheduler.has_fired("n1"));

        scheduler.schedule("n1", now + Duration::minutes(9), now);
        assert!(!scheduler.has_fired("n1"));
    }
}
