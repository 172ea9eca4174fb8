pub mod alerts;
pub mod health;
pub mod notifications;
pub mod timeline;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                     WebSocket (browser notifications)
///
/// /alerts                                 list, clear all
/// /alerts/evaluate                        run an evaluation pass
/// /alerts/{id}/acknowledge                acknowledge
/// /alerts/{id}                            dismiss
///
/// /timeline/goals                         get, replace
/// /timeline/summary                       dashboard counts
///
/// /notifications/preferences              get, replace
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/alerts", alerts::router())
        .nest("/timeline", timeline::router())
        .nest("/notifications", notifications::router())
}
