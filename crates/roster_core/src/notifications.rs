use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error_handler::classify_error;

/// Toast flavour shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppNotification {
    pub id: String,
    pub notification_type: NotificationType,
    pub title: Option<String>,
    pub message: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

impl AppNotification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            notification_type,
            title: None,
            message: message.into(),
            read: false,
            timestamp: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationType::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationType::Warning, message)
    }

    /// Error toast carrying the user-facing text for `error`, never the raw
    /// error chain.
    pub fn from_error(error: &anyhow::Error) -> Self {
        let classified = classify_error(error);
        Self::new(NotificationType::Error, classified.user_message)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// In-memory notification store, newest first.
pub struct NotificationStore {
    notifications: Vec<AppNotification>,
    max_notifications: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::with_capacity(50)
    }

    pub fn with_capacity(max_notifications: usize) -> Self {
        Self {
            notifications: Vec::new(),
            max_notifications: max_notifications.max(1),
        }
    }

    pub fn push(&mut self, notification: AppNotification) {
        self.notifications.insert(0, notification);
        self.notifications.truncate(self.max_notifications);
    }

    pub fn latest(&self) -> Option<&AppNotification> {
        self.notifications.first()
    }

    pub fn mark_read(&mut self, id: &str) {
        if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.notifications {
            n.read = true;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn all(&self) -> &[AppNotification] {
        &self.notifications
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::RosterError;

    #[test]
    fn create_notification() {
        let n = AppNotification::new(NotificationType::Info, "Exporting 40 voters");
        assert_eq!(n.message, "Exporting 40 voters");
        assert_eq!(n.notification_type, NotificationType::Info);
        assert!(!n.read);
        assert!(n.title.is_none());
    }

    #[test]
    fn notification_with_title() {
        let n = AppNotification::success("Saved ward_3_voters.csv").with_title("Export complete");
        assert_eq!(n.title.as_deref(), Some("Export complete"));
        assert_eq!(n.notification_type, NotificationType::Success);
    }

    #[test]
    fn error_notification_uses_user_message() {
        let err = anyhow::Error::new(RosterError::Backend("relation voters_12 missing".into()));
        let n = AppNotification::from_error(&err);
        assert_eq!(n.notification_type, NotificationType::Error);
        assert_eq!(n.message, "Could not load voter data. Please try again.");
    }

    #[test]
    fn store_newest_first() {
        let mut store = NotificationStore::new();
        store.push(AppNotification::warning("first"));
        store.push(AppNotification::success("second"));
        assert_eq!(store.all()[0].message, "second");
        assert_eq!(store.latest().map(|n| n.message.as_str()), Some("second"));
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn store_mark_read() {
        let mut store = NotificationStore::new();
        store.push(AppNotification::warning("msg"));
        let id = store.all()[0].id.clone();

        store.mark_read(&id);
        assert_eq!(store.unread_count(), 0);

        store.mark_read("nonexistent-id");
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn store_mark_all_read_and_clear() {
        let mut store = NotificationStore::new();
        for m in ["a", "b", "c"] {
            store.push(AppNotification::new(NotificationType::Info, m));
        }
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);

        store.clear();
        assert!(store.all().is_empty());
        assert!(store.latest().is_none());
    }

    #[test]
    fn store_truncates_at_capacity() {
        let mut store = NotificationStore::with_capacity(3);
        for i in 0..5 {
            store.push(AppNotification::new(NotificationType::Info, format!("msg{i}")));
        }
        assert_eq!(store.all().len(), 3);
        assert_eq!(store.all()[0].message, "msg4");
    }
}
