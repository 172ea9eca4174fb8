//! Unit tests for `WsManager` and notification forwarding.
//!
//! These exercise the connection manager directly, without performing any
//! HTTP upgrades.

use std::sync::Arc;

use axum::extract::ws::Message;
use recon_api::notifications::forwarder::notification_message;
use recon_api::notifications::NotificationForwarder;
use recon_api::ws::WsManager;
use recon_events::delivery::browser::BrowserNotification;
use recon_events::NotificationBus;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _rx1 = manager.add("conn-1".to_string()).await;
    let _rx2 = manager.add("conn-2".to_string()).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn broadcast_reaches_every_connection() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("conn-1".to_string()).await;
    let mut rx2 = manager.add("conn-2".to_string()).await;

    let sent = manager.broadcast(Message::Text("hello".into())).await;
    assert_eq!(sent, 2);

    for rx in [&mut rx1, &mut rx2] {
        match rx.recv().await {
            Some(Message::Text(text)) => assert_eq!(text.as_str(), "hello"),
            other => panic!("expected text message, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn broadcast_skips_closed_receivers() {
    let manager = WsManager::new();
    let rx = manager.add("gone".to_string()).await;
    drop(rx);
    let _live = manager.add("live".to_string()).await;

    assert_eq!(manager.broadcast(Message::Text("x".into())).await, 1);
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string()).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert!(matches!(rx.recv().await, Some(Message::Close(None))));
}

#[test]
fn notification_frame_shape() {
    let note = BrowserNotification::plain("OVERDUE: 2019 Kia Soul", "Shop: 4/3 days", "timeline-1-shop");
    let Message::Text(text) = notification_message(&note).unwrap() else {
        panic!("expected a text frame");
    };
    let json: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(json["type"], "notification");
    assert_eq!(json["data"]["title"], "OVERDUE: 2019 Kia Soul");
    assert_eq!(json["data"]["tag"], "timeline-1-shop");
}

#[tokio::test]
async fn forwarder_pushes_bus_notifications_to_clients() {
    let manager = Arc::new(WsManager::new());
    let bus = NotificationBus::default();
    let cancel = CancellationToken::new();
    let mut rx = manager.add("dashboard".to_string()).await;

    let forwarder = NotificationForwarder::new(Arc::clone(&manager));
    let handle = tokio::spawn(forwarder.run(bus.subscribe(), cancel.clone()));

    bus.publish(BrowserNotification::plain("WARNING: 2020 VW Jetta", "body", "timeline-2-detail"));

    match rx.recv().await {
        Some(Message::Text(text)) => assert!(text.as_str().contains("WARNING: 2020 VW Jetta")),
        other => panic!("expected text message, got {other:?}"),
    }

    cancel.cancel();
    handle.await.unwrap();
}
