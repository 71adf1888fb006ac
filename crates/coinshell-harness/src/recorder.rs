//! Notifier that records instead of showing.

use std::sync::Arc;

use coinshell_app::{Notification, NotificationClass, Notifier};
use parking_lot::Mutex;

/// Records every notification. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    shown: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything shown so far, in order.
    pub fn notifications(&self) -> Vec<Notification> {
        self.shown.lock().clone()
    }

    /// Number of notifications of `class`.
    pub fn count(&self, class: NotificationClass) -> usize {
        self.shown.lock().iter().filter(|n| n.class == class).count()
    }

    /// Forget everything recorded.
    pub fn clear(&self) {
        self.shown.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notification: Notification) {
        tracing::debug!(title = %notification.title, "Recorded notification");
        self.shown.lock().push(notification);
    }
}
