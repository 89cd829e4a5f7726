//! Decode notifications.
//!
//! Non-fatal anomalies found while decoding (an object whose trailing CRC
//! does not match, an unknown class number, a skipped object) are recorded
//! as notifications on the resulting document instead of aborting the read.

use std::fmt;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    /// Informational message
    Info,
    /// Something unexpected that did not affect the decoded data
    Warning,
    /// An object that could not be decoded and was skipped
    Error,
}

/// A single decode notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub notification_type: NotificationType,
    pub message: String,
}

impl Notification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.notification_type {
            NotificationType::Info => "info",
            NotificationType::Warning => "warning",
            NotificationType::Error => "error",
        };
        write!(f, "[{label}] {}", self.message)
    }
}
