/// Severity or category for user-visible notifications.
///
/// This enum classifies notifications by their intent, allowing the host to
/// display them appropriately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    /// Neutral informational message that does not indicate success or failure.
    Info,
    /// Indicates a successful operation, such as the player becoming ready.
    Success,
    /// Indicates a non-critical issue (autoplay blocked, slow readiness).
    Warning,
    /// Indicates an error that may affect playback.
    Error,
}

/// A notification payload intended for the host view.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    /// The type/severity of the notification.
    pub notification_type: NotificationType,
    /// The text content to display to the user.
    pub message: String,
}

impl NotificationMessage {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            message: message.into(),
        }
    }
}
