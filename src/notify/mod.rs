//! Transient user-facing notifications.
//!
//! The coordinator reports scan completions, failures, and progress through
//! a [`NotificationSink`](crate::core::NotificationSink). This module
//! provides the message type plus three sink implementations: an in-memory
//! sink whose messages expire after a display duration, a sink that
//! forwards to `tracing`, and a null sink for tests.

use crate::core::traits::NotificationSink;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// How long a transient message stays visible by default.
pub const DEFAULT_DISPLAY_TTL: Duration = Duration::from_millis(3000);

/// Severity of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, e.g. a progress update.
    Info,
    /// A completed operation.
    Success,
    /// A failed operation.
    Error,
}

/// A single transient message pushed by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// The message text.
    pub message: String,
    /// Message severity.
    pub severity: Severity,
    /// When the message was emitted.
    pub at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification with the given severity.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            at: Utc::now(),
        }
    }

    /// Creates an informational notification.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Creates a success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    /// Creates an error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

/// In-memory sink whose messages auto-expire after a display duration.
///
/// Messages older than the TTL are pruned whenever the visible set is
/// read, mirroring a dashboard toast that dismisses itself.
#[derive(Debug)]
pub struct TransientSink {
    ttl: chrono::Duration,
    messages: Mutex<Vec<Notification>>,
}

impl TransientSink {
    /// Creates a sink with the default 3 second display duration.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_DISPLAY_TTL)
    }

    /// Creates a sink with a custom display duration.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            messages: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the currently visible messages, pruning expired ones.
    pub fn visible(&self) -> Vec<Notification> {
        let cutoff = Utc::now() - self.ttl;
        let mut messages = self.lock();
        messages.retain(|n| n.at > cutoff);
        messages.clone()
    }

    /// Returns the number of currently visible messages.
    pub fn len(&self) -> usize {
        self.visible().len()
    }

    /// Returns `true` if no messages are currently visible.
    pub fn is_empty(&self) -> bool {
        self.visible().is_empty()
    }
}

impl Default for TransientSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for TransientSink {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
    }
}

/// Sink that forwards every message to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    /// Creates the sink.
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info => {
                tracing::info!(message = %notification.message, "notification")
            }
            Severity::Success => {
                tracing::info!(message = %notification.message, outcome = "success", "notification")
            }
            Severity::Error => {
                tracing::warn!(message = %notification.message, outcome = "error", "notification")
            }
        }
    }
}

/// Sink that drops every message, for tests that don't assert on output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notification: Notification) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_sink_records_messages() {
        let sink = TransientSink::new();
        sink.notify(Notification::success("Website added successfully!"));
        sink.notify(Notification::error("Scan failed"));

        let visible = sink.visible();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].severity, Severity::Success);
        assert_eq!(visible[1].severity, Severity::Error);
    }

    #[test]
    fn test_transient_sink_expires_messages() {
        let sink = TransientSink::with_ttl(Duration::from_millis(0));
        sink.notify(Notification::info("gone in a blink"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_null_sink_discards() {
        let sink = NullSink;
        sink.notify(Notification::info("nobody hears this"));
    }
}
