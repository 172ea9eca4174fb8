use std::sync::Arc;

use recon_events::AlertService;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (vehicle records).
    pub pool: recon_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Timeline goals, preferences, alerts and their delivery.
    pub alerts: Arc<AlertService>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
}

impl AppState {
    /// Save the timeline state file. Failures are logged, not returned: the
    /// in-memory change has already been applied.
    pub async fn persist(&self) {
        if let Err(e) = self.alerts.save().await {
            tracing::error!(error = %e, "Failed to save timeline state");
        }
    }
}
