//! User-facing notifications for load results.
//!
//! The pipeline reports each dataset success or failure, and the outcome of
//! a load-all sweep, through a [`Notifier`]. Delivery is fire-and-forget:
//! nothing the notifier does feeds back into dataset state.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// How prominently a notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A titled message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Info)
    }

    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Warning)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Error)
    }
}

/// Receives notifications. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Emits each notification as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Info => tracing::info!(title = %n.title, "{}", n.description),
            Severity::Warning => tracing::warn!(title = %n.title, "{}", n.description),
            Severity::Error => tracing::error!(title = %n.title, "{}", n.description),
        }
    }
}

/// Keeps every notification in memory, in arrival order.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    /// Remove and return everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_notifier_shares_buffer_between_clones() {
        let a = CollectingNotifier::new();
        let b = a.clone();
        a.notify(Notification::info("Dataset Loaded", "ok"));
        b.notify(Notification::error("Load Failed", "boom"));

        let seen = a.notifications();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].severity, Severity::Error);

        assert_eq!(b.drain().len(), 2);
        assert!(a.notifications().is_empty());
    }

    #[test]
    fn notifier_through_arc() {
        let inner = Arc::new(CollectingNotifier::new());
        let shared: Arc<CollectingNotifier> = Arc::clone(&inner);
        shared.notify(Notification::warning("Partial", "2/4 datasets loaded"));
        assert_eq!(inner.notifications()[0].description, "2/4 datasets loaded");
    }

    #[test]
    fn tracing_notifier_accepts_all_severities() {
        for severity in [Severity::Info, Severity::Warning, Severity::Error] {
            TracingNotifier.notify(Notification::new("t", "d", severity));
        }
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
    }
}
