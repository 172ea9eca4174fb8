//! Handlers for the `/alerts` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use recon_core::alert::{AlertType, TimelineAlert};
use recon_core::stage::Stage;
use recon_db::repositories::VehicleRepo;
use recon_events::EvaluationOutcome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /alerts`.
#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    pub step: Option<Stage>,
    #[serde(rename = "type")]
    pub alert_type: Option<AlertType>,
    /// If `true`, return only alerts nobody has acknowledged yet.
    pub unacknowledged: Option<bool>,
}

impl AlertQuery {
    fn matches(&self, alert: &TimelineAlert) -> bool {
        self.step.map_or(true, |s| alert.step == s)
            && self.alert_type.map_or(true, |t| alert.alert_type == t)
            && !(self.unacknowledged == Some(true) && alert.acknowledged)
    }
}

#[derive(Debug, Serialize)]
pub struct ClearedAlerts {
    pub cleared: usize,
}

fn parse_alert_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid alert id: {raw}")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/alerts
///
/// Stored alerts, newest first, optionally filtered by stage, type and
/// acknowledgement.
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> AppResult<Json<DataResponse<Vec<TimelineAlert>>>> {
    let alerts = state
        .alerts
        .alerts()
        .await
        .into_iter()
        .filter(|a| query.matches(a))
        .collect();
    Ok(Json(DataResponse::new(alerts)))
}

/// DELETE /api/v1/alerts
pub async fn clear_alerts(State(state): State<AppState>) -> AppResult<Json<DataResponse<ClearedAlerts>>> {
    let cleared = state.alerts.clear_all_alerts().await;
    state.persist().await;
    Ok(Json(DataResponse::new(ClearedAlerts { cleared })))
}

/// POST /api/v1/alerts/evaluate
///
/// Run an evaluation pass over the in-progress fleet right away.
pub async fn evaluate_alerts(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<EvaluationOutcome>>> {
    let vehicles = VehicleRepo::list_in_progress(&state.pool).await?;
    let outcome = state.alerts.evaluate(&vehicles, Utc::now()).await;
    state.persist().await;
    Ok(Json(DataResponse::new(outcome)))
}

/// POST /api/v1/alerts/{id}/acknowledge
///
/// Mark an alert as seen. Cancels any pending escalation for it.
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<TimelineAlert>>> {
    let id = parse_alert_id(&id)?;
    let alert = state.alerts.acknowledge_alert(id).await?;
    state.persist().await;
    Ok(Json(DataResponse::new(alert)))
}

/// DELETE /api/v1/alerts/{id}
///
/// Dismiss (remove) an alert. Returns 204 No Content on success.
pub async fn dismiss_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_alert_id(&id)?;
    state.alerts.dismiss_alert(id).await?;
    state.persist().await;
    Ok(StatusCode::NO_CONTENT)
}
