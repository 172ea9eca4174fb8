//! Timeline alert types raised when a vehicle runs long in a stage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stage::Stage;
use crate::types::{DbId, Timestamp};

/// Severity of a timeline alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    /// Elapsed days reached the warning threshold but not the target.
    Warning,
    /// Elapsed days reached or passed the target.
    Overdue,
}

impl AlertType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::Warning => "warning",
            AlertType::Overdue => "overdue",
        }
    }
}

/// Identity of an alert slot: one alert per vehicle per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertKey {
    pub vehicle_id: DbId,
    pub step: Stage,
}

impl AlertKey {
    pub fn new(vehicle_id: DbId, step: Stage) -> Self {
        Self { vehicle_id, step }
    }
}

/// A classified alert before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlert {
    pub vehicle_id: DbId,
    pub vehicle_info: String,
    pub vin: String,
    pub step: Stage,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub current_days: i64,
    pub target_days: i64,
    pub message: String,
}

impl NewAlert {
    pub fn key(&self) -> AlertKey {
        AlertKey::new(self.vehicle_id, self.step)
    }
}

/// A stored alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineAlert {
    pub id: Uuid,
    pub vehicle_id: DbId,
    pub vehicle_info: String,
    pub vin: String,
    pub step: Stage,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub current_days: i64,
    pub target_days: i64,
    pub message: String,
    pub timestamp: Timestamp,
    pub acknowledged: bool,
}

impl TimelineAlert {
    /// Stamp a fresh id and timestamp onto `data`.
    pub fn from_new(data: NewAlert, timestamp: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id: data.vehicle_id,
            vehicle_info: data.vehicle_info,
            vin: data.vin,
            step: data.step,
            alert_type: data.alert_type,
            current_days: data.current_days,
            target_days: data.target_days,
            message: data.message,
            timestamp,
            acknowledged: false,
        }
    }

    pub fn key(&self) -> AlertKey {
        AlertKey::new(self.vehicle_id, self.step)
    }

    /// Overdue, or at least one and a half times the target.
    pub fn is_critical(&self) -> bool {
        self.alert_type == AlertType::Overdue || self.current_days * 2 >= self.target_days * 3
    }
}
