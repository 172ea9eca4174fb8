//! In-memory alert collection.
//!
//! [`AlertStore`] holds at most one alert per `(vehicle_id, step)`: adding an
//! alert for an occupied key replaces the previous one. It does no I/O and
//! no delivery; [`AlertService`](crate::service::AlertService) wraps it with
//! notification dispatch and persistence.

use recon_core::alert::{AlertKey, NewAlert, TimelineAlert};
use recon_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TimelineAlert>", into = "Vec<TimelineAlert>")]
pub struct AlertStore {
    alerts: Vec<TimelineAlert>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new alert stamped with `now`, replacing any alert for the same key.
    ///
    /// Returns the stored record.
    pub fn add_alert(&mut self, data: NewAlert, now: Timestamp) -> TimelineAlert {
        let alert = TimelineAlert::from_new(data, now);
        let key = alert.key();
        self.alerts.retain(|a| a.key() != key);
        self.alerts.push(alert.clone());
        alert
    }

    /// Mark an alert acknowledged. Returns the updated alert, or `None` if unknown.
    pub fn acknowledge_alert(&mut self, id: Uuid) -> Option<TimelineAlert> {
        let alert = self.alerts.iter_mut().find(|a| a.id == id)?;
        alert.acknowledged = true;
        Some(alert.clone())
    }

    /// Remove an alert entirely.
    pub fn dismiss_alert(&mut self, id: Uuid) -> Option<TimelineAlert> {
        let pos = self.alerts.iter().position(|a| a.id == id)?;
        Some(self.alerts.remove(pos))
    }

    /// Remove every alert, returning how many were dropped.
    pub fn clear_all_alerts(&mut self) -> usize {
        let count = self.alerts.len();
        self.alerts.clear();
        count
    }

    /// Remove the alert for `key`, if any.
    pub fn resolve(&mut self, key: AlertKey) -> Option<TimelineAlert> {
        let pos = self.alerts.iter().position(|a| a.key() == key)?;
        Some(self.alerts.remove(pos))
    }

    pub fn get(&self, id: Uuid) -> Option<&TimelineAlert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    pub fn find_by_key(&self, key: AlertKey) -> Option<&TimelineAlert> {
        self.alerts.iter().find(|a| a.key() == key)
    }

    /// All alerts, newest first.
    pub fn list(&self) -> Vec<TimelineAlert> {
        let mut out = self.alerts.clone();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    pub fn keys(&self) -> Vec<AlertKey> {
        self.alerts.iter().map(TimelineAlert::key).collect()
    }

    pub fn unacknowledged_count(&self) -> usize {
        self.alerts.iter().filter(|a| !a.acknowledged).count()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// Loading keeps the last alert seen for each key, so a hand-edited or
/// stale file cannot break the one-per-key invariant.
impl From<Vec<TimelineAlert>> for AlertStore {
    fn from(alerts: Vec<TimelineAlert>) -> Self {
        let mut store = AlertStore::new();
        for alert in alerts {
            let key = alert.key();
            store.alerts.retain(|a| a.key() != key);
            store.alerts.push(alert);
        }
        store
    }
}

impl From<AlertStore> for Vec<TimelineAlert> {
    fn from(store: AlertStore) -> Self {
        store.alerts
    }
}
