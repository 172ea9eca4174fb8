//! Route definitions for the `/timeline` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::timeline;
use crate::state::AppState;

/// Routes mounted at `/timeline`.
///
/// ```text
/// GET    /goals     -> get_goals
/// PUT    /goals     -> update_goals
/// GET    /summary   -> get_summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/goals", get(timeline::get_goals).put(timeline::update_goals))
        .route("/summary", get(timeline::get_summary))
}
