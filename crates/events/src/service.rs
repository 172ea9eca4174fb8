//! The timeline alert engine as one shareable service.
//!
//! [`AlertService`] owns the [`TimelineState`] and wires the alert store to
//! notification dispatch, escalation timers and the state file. It is meant
//! to be shared as `Arc<AlertService>`; every method takes `&self`.
//!
//! Dispatch runs on a spawned task so callers never wait on email or
//! webhook round-trips. The returned [`DispatchedAlert`] carries the task
//! handle for callers (and tests) that do want the report.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use recon_core::alert::{AlertKey, NewAlert, TimelineAlert};
use recon_core::error::CoreError;
use recon_core::goals::TimelineGoals;
use recon_core::preferences::NotificationPreferences;
use recon_core::timeline::{self, Evaluation, TimelineSummary};
use recon_core::types::{DbId, Timestamp};
use recon_core::vehicle::Vehicle;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::dispatcher::{ChannelConfig, DispatchReport, NotificationDispatcher};
use crate::escalation::EscalationScheduler;
use crate::persistence::{PersistenceError, StateFile, TimelineState};

/// A stored alert together with its in-flight delivery.
pub struct DispatchedAlert {
    pub alert: TimelineAlert,
    pub delivery: JoinHandle<DispatchReport>,
}

/// What an evaluation pass changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationOutcome {
    /// Alerts that were stored and dispatched by this pass.
    pub raised: Vec<TimelineAlert>,
    /// Classified alerts identical to the stored one, left untouched.
    pub unchanged: usize,
    /// Stored alerts removed because their stage is no longer open.
    pub resolved: usize,
}

pub struct AlertService {
    state: Arc<RwLock<TimelineState>>,
    channels: Arc<RwLock<Arc<ChannelConfig>>>,
    dispatcher: Arc<NotificationDispatcher>,
    escalations: Arc<EscalationScheduler>,
    file: Option<StateFile>,
    save_lock: Mutex<()>,
}

impl AlertService {
    /// In-memory service with default goals and preferences.
    pub fn new(dispatcher: NotificationDispatcher) -> Self {
        Self {
            state: Arc::new(RwLock::new(TimelineState::default())),
            channels: Arc::new(RwLock::new(Arc::new(ChannelConfig::default()))),
            dispatcher: Arc::new(dispatcher),
            escalations: Arc::new(EscalationScheduler::new()),
            file: None,
            save_lock: Mutex::new(()),
        }
    }

    /// Back the service with a state file. Call [`load`](Self::load) to read it.
    pub fn with_state_file(mut self, file: StateFile) -> Self {
        self.file = Some(file);
        self
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    pub fn escalations(&self) -> &Arc<EscalationScheduler> {
        &self.escalations
    }

    // -- persistence --------------------------------------------------------

    /// Replace the in-memory state with the state file's contents.
    ///
    /// Goals that fail validation fall back to the defaults. Escalation
    /// timers are not persisted, so none are pending after a load.
    pub async fn load(&self) -> Result<(), PersistenceError> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let mut loaded = file.load().await?;
        if let Err(e) = loaded.goals.clone().validated() {
            tracing::warn!(error = %e, "Stored goals are invalid, using defaults");
            loaded.goals = TimelineGoals::default();
        }

        let channels = ChannelConfig::from_preferences(loaded.preferences.clone());
        *self.state.write().await = loaded;
        *self.channels.write().await = Arc::new(channels);
        Ok(())
    }

    /// Write the current state to the state file, if one is configured.
    pub async fn save(&self) -> Result<(), PersistenceError> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let _guard = self.save_lock.lock().await;
        let snapshot = self.state.read().await.clone();
        file.save(&snapshot).await
    }

    // -- configuration ------------------------------------------------------

    pub async fn goals(&self) -> TimelineGoals {
        self.state.read().await.goals.clone()
    }

    /// Replace all stage goals. Existing alerts are left as they are until
    /// the next evaluation pass.
    pub async fn set_goals(&self, goals: TimelineGoals) -> Result<TimelineGoals, CoreError> {
        let goals = goals.validated()?;
        self.state.write().await.goals = goals.clone();
        tracing::info!(?goals, "Timeline goals updated");
        Ok(goals)
    }

    pub async fn preferences(&self) -> NotificationPreferences {
        self.state.read().await.preferences.clone()
    }

    /// Replace notification preferences. Turning escalation off cancels
    /// every pending escalation.
    pub async fn set_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences, CoreError> {
        let preferences = preferences.validated()?;
        let channels = ChannelConfig::from_preferences(preferences.clone());

        self.state.write().await.preferences = preferences.clone();
        *self.channels.write().await = Arc::new(channels);

        if !preferences.escalation.enabled {
            let cancelled = self.escalations.cancel_all().await;
            if cancelled > 0 {
                tracing::info!(cancelled, "Escalation disabled, pending escalations cancelled");
            }
        }
        tracing::info!("Notification preferences updated");
        Ok(preferences)
    }

    async fn channel_config(&self) -> Arc<ChannelConfig> {
        Arc::clone(&*self.channels.read().await)
    }

    // -- alerts -------------------------------------------------------------

    /// All stored alerts, newest first.
    pub async fn alerts(&self) -> Vec<TimelineAlert> {
        self.state.read().await.alerts.list()
    }

    pub async fn alert(&self, id: Uuid) -> Option<TimelineAlert> {
        self.state.read().await.alerts.get(id).cloned()
    }

    pub async fn unacknowledged_count(&self) -> usize {
        self.state.read().await.alerts.unacknowledged_count()
    }

    /// Store `data` (replacing any alert for its key) and dispatch it.
    pub async fn add_alert(&self, data: NewAlert, now: Timestamp) -> DispatchedAlert {
        let alert = self.state.write().await.alerts.add_alert(data, now);
        let channels = self.channel_config().await;
        let delivery = self.raise(&alert, channels, now).await;
        DispatchedAlert { alert, delivery }
    }

    pub async fn acknowledge_alert(&self, id: Uuid) -> Result<TimelineAlert, CoreError> {
        let alert = self
            .state
            .write()
            .await
            .alerts
            .acknowledge_alert(id)
            .ok_or_else(|| alert_not_found(id))?;
        self.escalations.cancel(alert.key()).await;
        tracing::info!(alert_id = %id, vehicle_id = alert.vehicle_id, step = %alert.step, "Alert acknowledged");
        Ok(alert)
    }

    pub async fn dismiss_alert(&self, id: Uuid) -> Result<TimelineAlert, CoreError> {
        let alert = self
            .state
            .write()
            .await
            .alerts
            .dismiss_alert(id)
            .ok_or_else(|| alert_not_found(id))?;
        self.escalations.cancel(alert.key()).await;
        tracing::info!(alert_id = %id, vehicle_id = alert.vehicle_id, step = %alert.step, "Alert dismissed");
        Ok(alert)
    }

    /// Remove every alert and cancel every pending escalation.
    pub async fn clear_all_alerts(&self) -> usize {
        let count = self.state.write().await.alerts.clear_all_alerts();
        self.escalations.cancel_all().await;
        tracing::info!(count, "All alerts cleared");
        count
    }

    // -- evaluation ---------------------------------------------------------

    /// Evaluate the complete set of in-progress vehicles against the current
    /// goals and apply the result.
    ///
    /// Stored alerts for vehicles missing from `vehicles` are resolved, so
    /// the batch must be the whole fleet, not a page of it.
    pub async fn evaluate(&self, vehicles: &[Vehicle], now: Timestamp) -> EvaluationOutcome {
        let goals = self.goals().await;
        let mut evaluation = timeline::evaluate(vehicles, &goals, now);

        let present: HashSet<DbId> = vehicles.iter().map(|v| v.id).collect();
        let departed = self.state.read().await.alerts.keys();
        evaluation
            .resolved
            .extend(departed.into_iter().filter(|k| !present.contains(&k.vehicle_id)));

        let outcome = self.apply_evaluation(evaluation, now).await;
        tracing::info!(
            vehicles = vehicles.len(),
            raised = outcome.raised.len(),
            unchanged = outcome.unchanged,
            resolved = outcome.resolved,
            "Timeline evaluation complete"
        );
        outcome
    }

    /// Apply a precomputed evaluation.
    ///
    /// An alert whose type, day counts and message match the stored one is skipped, so
    /// repeated passes within a day neither re-notify nor reset an
    /// acknowledgement. Anything else replaces the stored alert and is
    /// dispatched.
    pub async fn apply_evaluation(&self, evaluation: Evaluation, now: Timestamp) -> EvaluationOutcome {
        let mut outcome = EvaluationOutcome::default();
        let mut resolved_keys: Vec<AlertKey> = Vec::new();

        {
            let mut state = self.state.write().await;
            for key in evaluation.resolved {
                if state.alerts.resolve(key).is_some() {
                    resolved_keys.push(key);
                }
            }
            for data in evaluation.alerts {
                let same = state.alerts.find_by_key(data.key()).is_some_and(|stored| {
                    stored.alert_type == data.alert_type
                        && stored.current_days == data.current_days
                        && stored.target_days == data.target_days
                        && stored.message == data.message
                });
                if same {
                    outcome.unchanged += 1;
                } else {
                    outcome.raised.push(state.alerts.add_alert(data, now));
                }
            }
        }

        outcome.resolved = resolved_keys.len();
        for key in resolved_keys {
            self.escalations.cancel(key).await;
            tracing::debug!(vehicle_id = key.vehicle_id, step = %key.step, "Alert resolved");
        }

        let channels = self.channel_config().await;
        for alert in &outcome.raised {
            // Delivery is fire-and-forget here; dropping the handle detaches it.
            let _ = self.raise(alert, Arc::clone(&channels), now).await;
        }
        outcome
    }

    /// Per-stage counts for `vehicles` against the current goals.
    pub async fn summary(&self, vehicles: &[Vehicle], now: Timestamp) -> TimelineSummary {
        let goals = self.goals().await;
        timeline::summarize(vehicles, &goals, now)
    }

    // -- internals ----------------------------------------------------------

    /// Spawn delivery for a freshly stored alert and (re)arm its escalation.
    async fn raise(
        &self,
        alert: &TimelineAlert,
        channels: Arc<ChannelConfig>,
        now: Timestamp,
    ) -> JoinHandle<DispatchReport> {
        let escalation = &channels.preferences.escalation;
        if escalation.enabled && alert.is_critical() {
            let delay = Duration::from_secs(u64::from(escalation.delay_minutes) * 60);
            let task = self.escalation_task(alert.id);
            self.escalations.schedule(alert.key(), delay, task).await;
        } else {
            self.escalations.cancel(alert.key()).await;
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let alert = alert.clone();
        tokio::spawn(async move { dispatcher.dispatch(&alert, &channels, now).await })
    }

    /// The deferred escalation for `alert_id`.
    ///
    /// Runs only if that exact alert is still stored and unacknowledged and
    /// escalation is still enabled when the timer fires.
    fn escalation_task(&self, alert_id: Uuid) -> impl std::future::Future<Output = ()> + Send + 'static {
        let state = Arc::clone(&self.state);
        let channels = Arc::clone(&self.channels);
        let dispatcher = Arc::clone(&self.dispatcher);

        async move {
            let current = state.read().await.alerts.get(alert_id).cloned();
            let channels = Arc::clone(&*channels.read().await);

            match current {
                Some(alert) if !alert.acknowledged && channels.preferences.escalation.enabled => {
                    tracing::info!(
                        alert_id = %alert.id,
                        vehicle_id = alert.vehicle_id,
                        step = %alert.step,
                        "Escalating unacknowledged alert"
                    );
                    dispatcher.dispatch_escalation(&alert, &channels).await;
                }
                _ => {
                    tracing::debug!(alert_id = %alert_id, "Escalation no longer needed");
                }
            }
        }
    }
}

fn alert_not_found(id: Uuid) -> CoreError {
    CoreError::NotFound {
        entity: "TimelineAlert",
        id: id.to_string(),
    }
}
