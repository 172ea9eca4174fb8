//! Delivery channels for timeline alerts.
//!
//! Each channel formats an alert for its medium and reports a
//! [`ChannelResult`] per target; failures are values, never panics.

pub mod browser;
pub mod email;
pub mod webhook;

use recon_core::alert::{AlertType, TimelineAlert};
use serde::Serialize;

/// How loudly an alert is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Warning,
    Overdue,
    Escalation,
}

impl Urgency {
    /// Urgency for a first-time delivery of `alert`.
    pub fn for_alert(alert: &TimelineAlert) -> Self {
        match alert.alert_type {
            AlertType::Warning => Urgency::Warning,
            AlertType::Overdue => Urgency::Overdue,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Urgency::Warning => "WARNING",
            Urgency::Overdue => "OVERDUE",
            Urgency::Escalation => "ESCALATION",
        }
    }

    /// Overdue and escalation notices are treated as critical.
    pub fn is_critical(self) -> bool {
        !matches!(self, Urgency::Warning)
    }
}

/// Outcome of a delivery attempt to a single target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelResult {
    /// Channel name (see [`recon_core::channels`]).
    pub channel: &'static str,
    /// Where the alert went: recipient address, URL, or bus.
    pub target: String,
    /// `None` on success, otherwise the rendered error.
    pub error: Option<String>,
}

impl ChannelResult {
    pub fn delivered(channel: &'static str, target: impl Into<String>) -> Self {
        Self {
            channel,
            target: target.into(),
            error: None,
        }
    }

    pub fn failed(channel: &'static str, target: impl Into<String>, error: impl ToString) -> Self {
        Self {
            channel,
            target: target.into(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
