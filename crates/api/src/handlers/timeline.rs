//! Handlers for the `/timeline` resource: stage goals and the dashboard summary.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use recon_core::goals::TimelineGoals;
use recon_core::timeline::TimelineSummary;
use recon_db::repositories::VehicleRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/timeline/goals
pub async fn get_goals(State(state): State<AppState>) -> AppResult<Json<DataResponse<TimelineGoals>>> {
    Ok(Json(DataResponse::new(state.alerts.goals().await)))
}

/// PUT /api/v1/timeline/goals
///
/// Replace all four stage goals. Targets must be 1..=365 days and warning
/// percentages 1..=100.
pub async fn update_goals(
    State(state): State<AppState>,
    Json(goals): Json<TimelineGoals>,
) -> AppResult<Json<DataResponse<TimelineGoals>>> {
    let goals = state.alerts.set_goals(goals).await?;
    state.persist().await;
    Ok(Json(DataResponse::new(goals)))
}

/// GET /api/v1/timeline/summary
///
/// Per-stage on-track / at-risk / overdue counts for the in-progress fleet.
pub async fn get_summary(State(state): State<AppState>) -> AppResult<Json<DataResponse<TimelineSummary>>> {
    let vehicles = VehicleRepo::list_in_progress(&state.pool).await?;
    let summary = state.alerts.summary(&vehicles, Utc::now()).await;
    Ok(Json(DataResponse::new(summary)))
}
