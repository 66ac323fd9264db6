//! Event bus for estatedash using tokio::broadcast
//!
//! Provides a publish-subscribe mechanism for report batch updates.

use tokio::sync::broadcast;

use crate::analytics::ReportKind;

/// Events emitted by the report store
#[derive(Debug, Clone)]
pub enum ReportEvent {
    /// A batch was issued
    LoadStarted { seq: u64, kind: ReportKind },
    /// The latest batch committed its dataset
    LoadCompleted { seq: u64, kind: ReportKind },
    /// A batch finished after a newer one was issued; its data was dropped
    StaleDiscarded { seq: u64, latest: u64 },
    /// The latest batch failed as a whole; shown once to the user
    FetchFailed { seq: u64, message: String },
}

/// Event bus for broadcasting report events
///
/// Uses tokio::broadcast for multi-consumer support.
/// The TUI subscribes for redraw triggers and failure toasts.
pub struct EventBus {
    sender: broadcast::Sender<ReportEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (64 events)
    pub fn default_capacity() -> Self {
        Self::new(64)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: ReportEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
