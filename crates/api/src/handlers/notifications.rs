//! Handlers for `/notifications/preferences`.

use axum::extract::State;
use axum::Json;
use recon_core::preferences::NotificationPreferences;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/notifications/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<NotificationPreferences>>> {
    Ok(Json(DataResponse::new(state.alerts.preferences().await)))
}

/// PUT /api/v1/notifications/preferences
///
/// Replace the notification preferences. Omitted sections keep their
/// defaults, not their previous values.
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(preferences): Json<NotificationPreferences>,
) -> AppResult<Json<DataResponse<NotificationPreferences>>> {
    let preferences = state.alerts.set_preferences(preferences).await?;
    state.persist().await;
    Ok(Json(DataResponse::new(preferences)))
}
