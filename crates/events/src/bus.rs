//! In-process notification bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`NotificationBus`] carries [`BrowserNotification`]s from the dispatcher
//! to whoever renders them (the WebSocket layer in the API server). It is
//! designed to be shared via `Arc<NotificationBus>` across the application.

use tokio::sync::broadcast;

use crate::delivery::browser::BrowserNotification;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Fan-out bus for browser notifications.
///
/// Every subscriber independently receives every published notification.
pub struct NotificationBus {
    sender: broadcast::Sender<BrowserNotification>,
}

impl NotificationBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed notifications are
    /// dropped and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notification to all current subscribers.
    ///
    /// Returns how many subscribers received it. With no subscribers the
    /// notification is dropped and 0 is returned.
    pub fn publish(&self, notification: BrowserNotification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BrowserNotification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
