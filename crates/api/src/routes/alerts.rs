//! Route definitions for the `/alerts` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::alerts;
use crate::state::AppState;

/// Routes mounted at `/alerts`.
///
/// ```text
/// GET    /                   -> list_alerts
/// DELETE /                   -> clear_alerts
/// POST   /evaluate           -> evaluate_alerts
/// POST   /{id}/acknowledge   -> acknowledge_alert
/// DELETE /{id}               -> dismiss_alert
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(alerts::list_alerts).delete(alerts::clear_alerts))
        .route("/evaluate", post(alerts::evaluate_alerts))
        .route("/{id}/acknowledge", post(alerts::acknowledge_alert))
        .route("/{id}", delete(alerts::dismiss_alert))
}
