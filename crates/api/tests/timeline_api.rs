//! HTTP-level integration tests for goals, preferences and the timeline summary.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, build_test_app_with_state, get, put_json};
use recon_core::goals::StageGoal;
use serde_json::json;

fn goals_body(shop_target: i64) -> serde_json::Value {
    json!({
        "shop": { "target": shop_target, "warning": 70 },
        "detail": { "target": 2, "warning": 80 },
        "photo": { "target": 1, "warning": 80 },
        "total": { "target": 7, "warning": 80 },
    })
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn default_goals_are_served() {
    let app = build_test_app();
    let response = get(app.router, "/api/v1/timeline/goals").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["shop"], json!({ "target": 3, "warning": 80 }));
    assert_eq!(json["data"]["total"]["target"], 7);
}

#[tokio::test]
async fn goals_can_be_replaced() {
    let app = build_test_app();
    let response = put_json(app.router.clone(), "/api/v1/timeline/goals", goals_body(5)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(app.router, "/api/v1/timeline/goals").await).await;
    assert_eq!(json["data"]["shop"]["target"], 5);
    assert_eq!(app.alerts.goals().await.shop, StageGoal::new(5, 70));
}

#[tokio::test]
async fn out_of_range_goal_is_validation_error() {
    let app = build_test_app();
    let response = put_json(app.router, "/api/v1/timeline/goals", goals_body(0)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(app.alerts.goals().await.shop.target, 3);
}

#[tokio::test]
async fn incomplete_goals_body_is_rejected() {
    let app = build_test_app();
    let response = put_json(
        app.router,
        "/api/v1/timeline/goals",
        json!({ "shop": { "target": 4, "warning": 80 } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn goal_changes_are_saved_to_the_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timeline-state.json");
    let app = build_test_app_with_state(&path);

    let response = put_json(app.router, "/api/v1/timeline/goals", goals_body(6)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let saved: serde_json::Value =
        serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
    assert_eq!(saved["goals"]["shop"]["target"], 6);
}

#[tokio::test]
async fn summary_without_database_is_internal_error() {
    let app = build_test_app();
    let response = get(app.router, "/api/v1/timeline/summary").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ---------------------------------------------------------------------------
// Notification preferences
// ---------------------------------------------------------------------------

#[tokio::test]
async fn default_preferences_are_served() {
    let app = build_test_app();
    let json = body_json(get(app.router, "/api/v1/notifications/preferences").await).await;

    assert_eq!(json["data"]["browser"]["enabled"], true);
    assert_eq!(json["data"]["email"]["enabled"], false);
    assert_eq!(json["data"]["escalation"]["delay_minutes"], 60);
    assert_eq!(json["data"]["quiet_hours"]["start_hour"], 22);
}

#[tokio::test]
async fn preferences_can_be_replaced() {
    let app = build_test_app();
    let body = json!({
        "webhook": {
            "enabled": true,
            "urls": ["https://hooks.slack.com/services/T000/B000/XXXX"]
        },
        "escalation": {
            "enabled": true,
            "delay_minutes": 30,
            "manager_emails": ["manager@example.com"]
        }
    });

    let response = put_json(app.router, "/api/v1/notifications/preferences", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["escalation"]["delay_minutes"], 30);
    // Omitted sections fall back to defaults.
    assert_eq!(json["data"]["browser"]["sound"], true);

    let stored = app.alerts.preferences().await;
    assert!(stored.webhook.enabled);
    assert_eq!(stored.escalation.manager_emails, vec!["manager@example.com"]);
}

#[tokio::test]
async fn invalid_webhook_url_is_rejected() {
    let app = build_test_app();
    let body = json!({ "webhook": { "enabled": true, "urls": ["not a url"] } });

    let response = put_json(app.router, "/api/v1/notifications/preferences", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(!app.alerts.preferences().await.webhook.enabled);
}

#[tokio::test]
async fn invalid_recipient_email_is_rejected() {
    let app = build_test_app();
    let body = json!({ "email": { "enabled": true, "recipient": "nobody" } });

    let response = put_json(app.router, "/api/v1/notifications/preferences", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
