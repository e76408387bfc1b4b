//! Transient user notifications
//!
//! A session holds at most one notification. Showing a new one replaces the
//! pending one together with its deadline.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: Instant,
}

/// Single-slot notification holder with a fixed time-to-live
#[derive(Debug, Clone)]
pub struct NotificationSlot {
    ttl: Duration,
    pending: Option<Notification>,
}

impl NotificationSlot {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, pending: None }
    }

    /// Replace whatever is pending
    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.show_at(message, kind, Instant::now());
    }

    pub fn show_at(&mut self, message: impl Into<String>, kind: NotificationKind, now: Instant) {
        self.pending = Some(Notification {
            message: message.into(),
            kind,
            expires_at: now + self.ttl,
        });
    }

    /// The pending notification, unless it has expired
    pub fn current(&self) -> Option<&Notification> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<&Notification> {
        self.pending.as_ref().filter(|n| now < n.expires_at)
    }

    pub fn dismiss(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_expires() {
        let mut slot = NotificationSlot::new(Duration::from_millis(3000));
        let now = Instant::now();
        slot.show_at("Undo", NotificationKind::Info, now);

        assert_eq!(slot.current_at(now).unwrap().message, "Undo");
        assert!(slot.current_at(now + Duration::from_millis(2999)).is_some());
        assert!(slot.current_at(now + Duration::from_millis(3000)).is_none());
    }

    #[test]
    fn test_new_notification_replaces_pending() {
        let mut slot = NotificationSlot::new(Duration::from_millis(100));
        let start = Instant::now();
        slot.show_at("first", NotificationKind::Info, start);

        let later = start + Duration::from_millis(80);
        slot.show_at("second", NotificationKind::Error, later);

        // The first deadline no longer applies
        let current = slot.current_at(start + Duration::from_millis(150)).unwrap();
        assert_eq!(current.message, "second");
        assert_eq!(current.kind, NotificationKind::Error);
    }

    #[test]
    fn test_dismiss() {
        let mut slot = NotificationSlot::new(Duration::from_secs(60));
        slot.show("saved", NotificationKind::Success);
        assert!(slot.current().is_some());
        slot.dismiss();
        assert!(slot.current().is_none());
    }
}
