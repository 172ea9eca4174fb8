//! Bus-to-WebSocket forwarding.

use std::sync::Arc;

use axum::extract::ws::Message;
use recon_events::delivery::browser::BrowserNotification;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::ws::WsManager;

/// WebSocket frame carrying a browser notification.
#[derive(Serialize)]
struct NotificationFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a BrowserNotification,
}

/// Render `notification` as the JSON text frame clients expect:
/// `{"type": "notification", "data": {...}}`.
pub fn notification_message(notification: &BrowserNotification) -> Result<Message, serde_json::Error> {
    let text = serde_json::to_string(&NotificationFrame {
        kind: "notification",
        data: notification,
    })?;
    Ok(Message::Text(text.into()))
}

/// Pushes every published browser notification to all WebSocket clients.
pub struct NotificationForwarder {
    ws_manager: Arc<WsManager>,
}

impl NotificationForwarder {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Forward notifications until `cancel` fires or the bus closes.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<BrowserNotification>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification forwarder stopping");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(notification) => self.forward(&notification).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Notification forwarder lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Notification bus closed, forwarder shutting down");
                        break;
                    }
                },
            }
        }
    }

    async fn forward(&self, notification: &BrowserNotification) {
        match notification_message(notification) {
            Ok(message) => {
                let sent = self.ws_manager.broadcast(message).await;
                tracing::debug!(tag = %notification.tag, sent, "Browser notification forwarded");
            }
            Err(e) => {
                tracing::error!(error = %e, tag = %notification.tag, "Failed to encode notification");
            }
        }
    }
}
