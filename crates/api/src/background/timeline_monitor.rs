//! Periodic timeline evaluation.
//!
//! Loads every in-progress vehicle, evaluates it against the stage goals and
//! saves the resulting alert state. Runs on a fixed interval using
//! `tokio::time::interval`; the first pass happens immediately.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use recon_db::repositories::VehicleRepo;
use recon_db::DbPool;
use recon_events::{AlertService, EvaluationOutcome};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run one evaluation pass and save the state file.
pub async fn evaluate_once(pool: &DbPool, alerts: &AlertService) -> anyhow::Result<EvaluationOutcome> {
    let vehicles = VehicleRepo::list_in_progress(pool)
        .await
        .context("loading in-progress vehicles")?;
    let outcome = alerts.evaluate(&vehicles, Utc::now()).await;
    alerts.save().await.context("saving timeline state")?;
    Ok(outcome)
}

/// Run the evaluation loop until `cancel` is triggered.
pub async fn run(pool: DbPool, alerts: Arc<AlertService>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Timeline monitor started");

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Timeline monitor stopping");
                break;
            }
            _ = interval.tick() => {
                match evaluate_once(&pool, &alerts).await {
                    Ok(outcome) => {
                        if outcome.raised.is_empty() && outcome.resolved == 0 {
                            tracing::debug!(unchanged = outcome.unchanged, "Timeline monitor: no changes");
                        } else {
                            tracing::info!(
                                raised = outcome.raised.len(),
                                resolved = outcome.resolved,
                                "Timeline monitor: alerts updated"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = format!("{e:#}"), "Timeline monitor: evaluation failed");
                    }
                }
            }
        }
    }
}
