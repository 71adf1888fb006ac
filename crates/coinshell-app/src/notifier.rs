//! User notifications.
//!
//! The shell never reaches for a process-wide tray icon. A [`Notifier`] is
//! constructed by the embedding application and passed in, so tests can
//! substitute one that records what was shown.

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationClass {
    /// Informational, e.g. an incoming transaction.
    Information,
    /// Something the user should look at, e.g. a rejected payment request.
    Warning,
    /// Error reported by the backend.
    Critical,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub class: NotificationClass,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Whether the backend asked for the message to block interaction.
    pub modal: bool,
}

impl Notification {
    /// Non-modal notification.
    pub fn new(class: NotificationClass, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { class, title: title.into(), message: message.into(), modal: false }
    }
}

/// Sink for user notifications.
pub trait Notifier: Send {
    /// Show `notification` to the user.
    fn notify(&mut self, notification: Notification);
}

/// Notifier that writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notification: Notification) {
        let Notification { class, title, message, modal } = notification;
        match class {
            NotificationClass::Information => tracing::info!(%title, %message, "Notification"),
            NotificationClass::Warning => tracing::warn!(%title, %message, modal, "Notification"),
            NotificationClass::Critical => tracing::error!(%title, %message, modal, "Notification"),
        }
    }
}
