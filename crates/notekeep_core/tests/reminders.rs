use chrono::{Duration, TimeZone, Utc};
use notekeep_core::model::note::{NewNote, Reminder};
use notekeep_core::reminder::Alert;
use notekeep_core::storage::MemoryKvStore;
use notekeep_core::{ManualClock, NotesStore, NotificationCenter};

fn open_store() -> (NotesStore<MemoryKvStore>, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap());
    let store = NotesStore::open(MemoryKvStore::new(), Box::new(clock.clone())).unwrap();
    (store, clock)
}

#[test]
fn cleanup_keeps_future_reminders_and_clears_past_ones() {
    let (mut store, clock) = open_store();
    let note = store.create_note(None, NewNote::titled("Call")).unwrap();
    let start = note.created_at;
    store
        .set_reminder(&note.id, Some(Reminder::new(start + Duration::hours(1), "ring")))
        .unwrap();

    assert_eq!(store.cleanup_expired_reminders().unwrap(), 0);
    assert!(store.note(&note.id).unwrap().reminder.is_some());

    clock.advance(Duration::hours(1) + Duration::seconds(1));
    assert_eq!(store.cleanup_expired_reminders().unwrap(), 1);
    let cleared = store.note(&note.id).unwrap();
    assert!(cleared.reminder.is_none());
    assert_eq!(cleared.updated_at, start + Duration::hours(1) + Duration::seconds(1));
    assert!(store.pending_reminder(&note.id).is_none());
}

#[test]
fn due_reminder_fires_once_with_message() {
    let (mut store, clock) = open_store();
    let note = store
        .create_note(None, NewNote::titled("Dentist").with_content("bring card"))
        .unwrap();
    let due = note.created_at + Duration::minutes(30);
    store
        .set_reminder(&note.id, Some(Reminder::new(due, "leave now")))
        .unwrap();
    assert_eq!(store.next_reminder_due(), Some(due));

    let mut alerts: Vec<Alert> = Vec::new();
    clock.advance(Duration::minutes(29));
    assert_eq!(store.run_due_reminders(&mut alerts), 0);

    clock.advance(Duration::minutes(1));
    assert_eq!(store.run_due_reminders(&mut alerts), 1);
    assert_eq!(store.run_due_reminders(&mut alerts), 0);
    assert_eq!(
        alerts,
        vec![Alert {
            title: "Reminder: Dentist".to_string(),
            body: "leave now".to_string(),
            tag: note.id.clone(),
        }]
    );
}

#[test]
fn rescheduling_and_deleting_cancel_previous_timers() {
    let (mut store, clock) = open_store();
    let kept = store.create_note(None, NewNote::titled("kept")).unwrap();
    let deleted = store.create_note(None, NewNote::titled("deleted")).unwrap();
    let now = kept.created_at;

    store
        .set_reminder(&kept.id, Some(Reminder::new(now + Duration::minutes(5), "")))
        .unwrap();
    let first = store.pending_reminder(&kept.id).unwrap();
    store
        .set_reminder(&kept.id, Some(Reminder::new(now + Duration::minutes(20), "")))
        .unwrap();
    assert_ne!(store.pending_reminder(&kept.id), Some(first));

    store
        .set_reminder(&deleted.id, Some(Reminder::new(now + Duration::minutes(5), "")))
        .unwrap();
    store.delete_note(&deleted.id).unwrap();

    let mut alerts: Vec<Alert> = Vec::new();
    clock.advance(Duration::minutes(10));
    assert_eq!(store.run_due_reminders(&mut alerts), 0);

    clock.advance(Duration::minutes(10));
    assert_eq!(store.run_due_reminders(&mut alerts), 1);
    assert_eq!(alerts[0].tag, kept.id);
}

#[test]
fn clearing_or_past_reminder_schedules_nothing() {
    let (mut store, _clock) = open_store();
    let note = store.create_note(None, NewNote::titled("n")).unwrap();
    let now = note.created_at;

    store
        .set_reminder(&note.id, Some(Reminder::new(now + Duration::minutes(5), "")))
        .unwrap();
    store.set_reminder(&note.id, None).unwrap();
    assert!(store.pending_reminder(&note.id).is_none());

    store
        .set_reminder(&note.id, Some(Reminder::new(now - Duration::minutes(5), "")))
        .unwrap();
    assert!(store.note(&note.id).unwrap().reminder.is_some());
    assert!(store.pending_reminder(&note.id).is_none());
}

#[test]
fn reopening_reschedules_future_reminders_only() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap());
    let mut store = NotesStore::open(MemoryKvStore::new(), Box::new(clock.clone())).unwrap();
    let soon = store.create_note(None, NewNote::titled("soon")).unwrap();
    let later = store.create_note(None, NewNote::titled("later")).unwrap();
    let now = soon.created_at;
    store
        .set_reminder(&soon.id, Some(Reminder::new(now + Duration::minutes(1), "")))
        .unwrap();
    store
        .set_reminder(&later.id, Some(Reminder::new(now + Duration::hours(2), "")))
        .unwrap();
    let kv = store.kv().clone();

    clock.advance(Duration::minutes(30));
    let mut reopened = NotesStore::open(kv, Box::new(clock.clone())).unwrap();
    assert!(reopened.pending_reminder(&soon.id).is_none());
    assert!(reopened.pending_reminder(&later.id).is_some());

    let mut center = NotificationCenter::new(Box::new(clock.clone()));
    clock.advance(Duration::hours(2));
    assert_eq!(reopened.run_due_reminders(&mut center), 1);
    assert_eq!(center.notifications()[0].title.as_deref(), Some("Reminder: later"));
}

#[test]
fn reminder_elapsed_while_closed_alerts_before_cleanup() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap());
    let mut store = NotesStore::open(MemoryKvStore::new(), Box::new(clock.clone())).unwrap();
    let note = store
        .create_note(None, NewNote::titled("Standup"))
        .unwrap();
    store
        .set_reminder(
            &note.id,
            Some(Reminder::new(note.created_at + Duration::minutes(5), "join call")),
        )
        .unwrap();
    let kv = store.kv().clone();

    clock.advance(Duration::minutes(10));
    let mut reopened = NotesStore::open(kv, Box::new(clock.clone())).unwrap();
    let mut alerts: Vec<Alert> = Vec::new();
    assert_eq!(reopened.run_due_reminders(&mut alerts), 0);
    assert_eq!(reopened.alert_missed_reminders(&mut alerts), 1);
    assert_eq!(reopened.alert_missed_reminders(&mut alerts), 0);
    assert_eq!(alerts[0].title, "Reminder: Standup");
    assert_eq!(alerts[0].body, "join call");

    assert_eq!(reopened.cleanup_expired_reminders().unwrap(), 1);
    assert_eq!(reopened.alert_missed_reminders(&mut alerts), 0);
    assert_eq!(alerts.len(), 1);
}

#[test]
fn reminders_fired_by_timer_are_not_alerted_again() {
    let (mut store, clock) = open_store();
    let note = store.create_note(None, NewNote::titled("once")).unwrap();
    store
        .set_reminder(
            &note.id,
            Some(Reminder::new(note.created_at + Duration::minutes(1), "")),
        )
        .unwrap();

    let mut alerts: Vec<Alert> = Vec::new();
    clock.advance(Duration::minutes(2));
    assert_eq!(store.run_due_reminders(&mut alerts), 1);
    assert_eq!(store.alert_missed_reminders(&mut alerts), 0);
    assert_eq!(alerts.len(), 1);
}
