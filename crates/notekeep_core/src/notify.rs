//! In-app notification center.
//!
//! # Responsibility
//! - Hold the queue of transient, action and progress notifications.
//! - Receive reminder alerts through `AlertSink`.
//!
//! # Invariants
//! - Notification ids are unique for the lifetime of one center.
//! - Timed notifications disappear on the first `expire` at or after their
//!   deadline; persistent ones only through `remove`/`clear`.
//! - A progress notification gets a deadline once it reaches 100.

use crate::clock::Clock;
use crate::reminder::{Alert, AlertSink};
use chrono::{DateTime, Duration, Utc};
use log::debug;

const SUCCESS_DURATION_MS: i64 = 3_000;
const INFO_DURATION_MS: i64 = 3_000;
const WARNING_DURATION_MS: i64 = 4_000;
const ERROR_DURATION_MS: i64 = 5_000;
const ALERT_DURATION_MS: i64 = 5_000;
const PROGRESS_LINGER_MS: i64 = 1_000;

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    Progress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub title: Option<String>,
    pub tag: Option<String>,
    pub actions: Vec<NotificationAction>,
    /// 0..=100, only for `NotificationKind::Progress`.
    pub progress: Option<u8>,
    pub created_at: DateTime<Utc>,
    /// `None` means the notification stays until removed.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_persistent(&self) -> bool {
        self.expires_at.is_none()
    }
}

pub struct NotificationCenter {
    clock: Box<dyn Clock>,
    next_id: NotificationId,
    items: Vec<Notification>,
    alerts_enabled: bool,
}

impl NotificationCenter {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            next_id: 0,
            items: Vec::new(),
            alerts_enabled: true,
        }
    }

    /// Mirrors the `enableNotifications` setting for reminder alerts.
    pub fn set_alerts_enabled(&mut self, enabled: bool) {
        self.alerts_enabled = enabled;
    }

    /// Shows a notification; `duration_ms <= 0` makes it persistent.
    pub fn show(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration_ms: i64,
    ) -> NotificationId {
        let now = self.clock.now();
        let expires_at = (duration_ms > 0).then(|| now + Duration::milliseconds(duration_ms));
        self.push(Notification {
            id: 0,
            kind,
            message: message.into(),
            title: None,
            tag: None,
            actions: Vec::new(),
            progress: None,
            created_at: now,
            expires_at,
        })
    }

    pub fn success(&mut self, message: impl Into<String>) -> NotificationId {
        self.show(message, NotificationKind::Success, SUCCESS_DURATION_MS)
    }

    pub fn error(&mut self, message: impl Into<String>) -> NotificationId {
        self.show(message, NotificationKind::Error, ERROR_DURATION_MS)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> NotificationId {
        self.show(message, NotificationKind::Warning, WARNING_DURATION_MS)
    }

    pub fn info(&mut self, message: impl Into<String>) -> NotificationId {
        self.show(message, NotificationKind::Info, INFO_DURATION_MS)
    }

    /// Persistent notification carrying user actions.
    pub fn show_action(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        actions: Vec<NotificationAction>,
    ) -> NotificationId {
        let id = self.show(message, kind, 0);
        if let Some(item) = self.get_mut(id) {
            item.actions = actions;
        }
        id
    }

    pub fn show_progress(&mut self, message: impl Into<String>, progress: u8) -> NotificationId {
        let id = self.show(message, NotificationKind::Progress, 0);
        self.update_progress(id, progress, None);
        id
    }

    /// Updates a progress notification. Returns `false` for unknown ids.
    pub fn update_progress(
        &mut self,
        id: NotificationId,
        progress: u8,
        message: Option<String>,
    ) -> bool {
        let now = self.clock.now();
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        let progress = progress.min(100);
        item.progress = Some(progress);
        if let Some(message) = message {
            item.message = message;
        }
        if progress == 100 && item.expires_at.is_none() {
            item.expires_at = Some(now + Duration::milliseconds(PROGRESS_LINGER_MS));
        }
        true
    }

    pub fn remove(&mut self, id: NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drops every notification whose deadline has passed; returns how many.
    pub fn expire(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.items.len();
        self.items
            .retain(|item| item.expires_at.map_or(true, |deadline| deadline > now));
        before - self.items.len()
    }

    /// Tears the center down, returning how many notifications were pending.
    pub fn shutdown(mut self) -> usize {
        let pending = self.items.len();
        self.items.clear();
        debug!("event=notifications_shutdown module=notify status=ok pending={pending}");
        pending
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|item| item.id == id)
    }

    fn get_mut(&mut self, id: NotificationId) -> Option<&mut Notification> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    fn push(&mut self, mut notification: Notification) -> NotificationId {
        self.next_id += 1;
        notification.id = self.next_id;
        self.items.push(notification);
        self.next_id
    }
}

impl AlertSink for NotificationCenter {
    fn alert(&mut self, alert: &Alert) {
        if !self.alerts_enabled {
            debug!("event=alert_dropped module=notify status=skipped reason=disabled tag={}", alert.tag);
            return;
        }
        let id = self.show(alert.body.clone(), NotificationKind::Info, ALERT_DURATION_MS);
        if let Some(item) = self.get_mut(id) {
            item.title = Some(alert.title.clone());
            item.tag = Some(alert.tag.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationAction, NotificationCenter, NotificationKind};
    use crate::clock::ManualClock;
    use crate::reminder::{Alert, AlertSink};
    use chrono::{Duration, TimeZone, Utc};

    fn center() -> (NotificationCenter, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        (NotificationCenter::new(Box::new(clock.clone())), clock)
    }

    #[test]
    fn timed_notifications_expire_after_their_duration() {
        let (mut center, clock) = center();
        center.success("saved");
        center.error("failed");

        clock.advance(Duration::milliseconds(3_500));
        assert_eq!(center.expire(), 1);
        assert_eq!(center.notifications()[0].kind, NotificationKind::Error);

        clock.advance(Duration::seconds(2));
        assert_eq!(center.expire(), 1);
        assert!(center.notifications().is_empty());
    }

    #[test]
    fn action_notifications_are_persistent() {
        let (mut center, clock) = center();
        let id = center.show_action(
            "undo delete?",
            NotificationKind::Info,
            vec![NotificationAction {
                id: "undo".to_string(),
                label: "Undo".to_string(),
            }],
        );
        clock.advance(Duration::hours(1));
        assert_eq!(center.expire(), 0);
        assert!(center.get(id).unwrap().is_persistent());
        assert!(center.remove(id));
    }

    #[test]
    fn completed_progress_lingers_one_second() {
        let (mut center, clock) = center();
        let id = center.show_progress("exporting", 10);
        assert!(center.update_progress(id, 100, Some("done".to_string())));
        assert_eq!(center.get(id).unwrap().message, "done");

        clock.advance(Duration::milliseconds(999));
        assert_eq!(center.expire(), 0);
        clock.advance(Duration::milliseconds(1));
        assert_eq!(center.expire(), 1);
    }

    #[test]
    fn alerts_respect_enabled_flag() {
        let (mut center, _clock) = center();
        let alert = Alert {
            title: "Reminder: Call".to_string(),
            body: "ring Bob".to_string(),
            tag: "n1".to_string(),
        };

        center.alert(&alert);
        center.set_alerts_enabled(false);
        center.alert(&alert);

        assert_eq!(center.notifications().len(), 1);
        assert_eq!(center.notifications()[0].tag.as_deref(), Some("n1"));
        assert_eq!(center.shutdown(), 1);
    }
}
