//! Route definitions for the `/notifications` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /preferences   -> get_preferences
/// PUT    /preferences   -> update_preferences
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/preferences",
        get(notifications::get_preferences).put(notifications::update_preferences),
    )
}
