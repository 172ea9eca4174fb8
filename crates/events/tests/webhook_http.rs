//! Webhook delivery against real local HTTP listeners.

mod common;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use recon_core::alert::{AlertType, TimelineAlert};
use recon_core::channels::CHANNEL_WEBHOOK;
use recon_core::preferences::NotificationPreferences;
use recon_core::stage::Stage;
use recon_events::delivery::webhook::{deliver_all, HttpWebhookTransport, WebhookEndpoint, WebhookError, WebhookTransport};
use recon_events::delivery::Urgency;
use recon_events::{ChannelConfig, NotificationBus, NotificationDispatcher};
use serde_json::Value;

use common::new_alert;

type Hits = Arc<Mutex<Vec<(String, Value)>>>;

async fn accept(State(hits): State<Hits>, uri: Uri, Json(body): Json<Value>) -> StatusCode {
    hits.lock().unwrap().push((uri.path().to_string(), body));
    StatusCode::NO_CONTENT
}

async fn reject(State(hits): State<Hits>, uri: Uri, Json(body): Json<Value>) -> StatusCode {
    hits.lock().unwrap().push((uri.path().to_string(), body));
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Serve a receiver with one healthy Discord-style path and one failing path.
async fn spawn_receiver() -> (SocketAddr, Hits) {
    let hits: Hits = Arc::default();
    let app = Router::new()
        .route("/api/webhooks/discord/1", post(accept))
        .route("/hooks/generic", post(accept))
        .route("/hooks/broken", post(reject))
        .with_state(Arc::clone(&hits));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

fn overdue_alert() -> TimelineAlert {
    TimelineAlert::from_new(
        new_alert(31, Stage::Shop, AlertType::Overdue, 6, 5),
        Utc::now(),
    )
}

#[tokio::test]
async fn failing_endpoint_does_not_stop_the_others() {
    let (addr, hits) = spawn_receiver().await;
    let transport = HttpWebhookTransport::new(Duration::from_secs(5)).unwrap();
    let endpoints = vec![
        WebhookEndpoint::new(format!("http://{addr}/hooks/broken")),
        WebhookEndpoint::new(format!("http://{addr}/api/webhooks/discord/1")),
    ];

    let results = deliver_all(&transport, &endpoints, &overdue_alert(), Urgency::Overdue).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].error.as_deref(), Some("Webhook returned HTTP 500"));
    assert!(results[1].is_success());

    let hits = hits.lock().unwrap();
    assert_eq!(hits.len(), 2);
    let (_, discord) = hits
        .iter()
        .find(|(path, _)| path.contains("discord"))
        .unwrap();
    assert_eq!(discord["embeds"][0]["title"], "OVERDUE: 2022 Toyota RAV4");
    let (_, generic) = hits.iter().find(|(path, _)| path == "/hooks/broken").unwrap();
    assert_eq!(generic["event"], "timeline_alert");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_request_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let transport = HttpWebhookTransport::new(Duration::from_secs(2)).unwrap();

    let result = transport
        .post_json(&format!("http://{addr}/hook"), &serde_json::json!({}))
        .await;
    assert_matches!(result, Err(WebhookError::Request(_)));
}

#[tokio::test]
async fn dispatcher_posts_generic_payload_over_http() {
    let (addr, hits) = spawn_receiver().await;
    let transport = Arc::new(HttpWebhookTransport::new(Duration::from_secs(5)).unwrap());
    let dispatcher = NotificationDispatcher::new(Arc::new(NotificationBus::default()), transport);

    let mut prefs = NotificationPreferences::default();
    prefs.webhook.enabled = true;
    prefs.webhook.urls = vec![
        format!("http://{addr}/hooks/generic"),
        format!("http://{addr}/hooks/broken"),
    ];
    let alert = overdue_alert();

    let report = dispatcher
        .dispatch(&alert, &ChannelConfig::from_preferences(prefs), Utc::now())
        .await;

    assert_eq!(report.delivered(CHANNEL_WEBHOOK), 1);
    assert_eq!(report.failed(CHANNEL_WEBHOOK), 1);

    let hits = hits.lock().unwrap();
    let (_, body) = hits.iter().find(|(path, _)| path == "/hooks/generic").unwrap();
    assert_eq!(body["urgency"], "OVERDUE");
    assert_eq!(body["alert"]["id"], alert.id.to_string());
    assert_eq!(body["alert"]["type"], "overdue");
}
