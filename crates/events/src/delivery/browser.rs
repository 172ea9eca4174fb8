//! Native browser notifications.
//!
//! The server cannot raise a desktop notification itself; it publishes a
//! [`BrowserNotification`] on the [`NotificationBus`](crate::bus::NotificationBus)
//! and connected clients call the Notification API with these fields, playing
//! the attached tone if one is present.

use chrono::Utc;
use recon_core::alert::TimelineAlert;
use recon_core::types::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use super::Urgency;

/// Tone families: one beep for warnings, three quick beeps for anything critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TonePattern {
    SingleBeep,
    TripleBeep,
}

/// One oscillator burst, offset from the start of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Beep {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    pub offset_ms: u32,
}

/// A synthesized tone the client plays with the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToneSequence {
    pub pattern: TonePattern,
    pub beeps: Vec<Beep>,
}

impl TonePattern {
    pub fn for_urgency(urgency: Urgency) -> Self {
        if urgency.is_critical() {
            TonePattern::TripleBeep
        } else {
            TonePattern::SingleBeep
        }
    }

    pub fn sequence(self) -> ToneSequence {
        let beeps = match self {
            TonePattern::SingleBeep => vec![Beep {
                frequency_hz: 800,
                duration_ms: 200,
                offset_ms: 0,
            }],
            TonePattern::TripleBeep => (0..3)
                .map(|i| Beep {
                    frequency_hz: 1000,
                    duration_ms: 120,
                    offset_ms: i * 180,
                })
                .collect(),
        };
        ToneSequence {
            pattern: self,
            beeps,
        }
    }
}

/// Payload for the browser Notification API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserNotification {
    pub title: String,
    pub body: String,
    /// Notifications with the same tag replace each other on the client.
    pub tag: String,
    pub require_interaction: bool,
    pub sound: Option<ToneSequence>,
    pub alert_id: Option<Uuid>,
    pub timestamp: Timestamp,
}

impl BrowserNotification {
    /// A notification not tied to an alert (e.g. delivery failure notices).
    pub fn plain(title: impl Into<String>, body: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tag: tag.into(),
            require_interaction: false,
            sound: None,
            alert_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Render `alert` for the browser.
    pub fn for_alert(alert: &TimelineAlert, urgency: Urgency, with_sound: bool) -> Self {
        Self {
            title: format!("{}: {}", urgency.label(), alert.vehicle_info),
            body: format!(
                "{}: {}/{} days\n{}",
                alert.step.label(),
                alert.current_days,
                alert.target_days,
                alert.message
            ),
            tag: alert_tag(alert),
            require_interaction: urgency.is_critical(),
            sound: with_sound.then(|| TonePattern::for_urgency(urgency).sequence()),
            alert_id: Some(alert.id),
            timestamp: Utc::now(),
        }
    }

    /// Fallback shown when the email channel could not deliver `alert`.
    pub fn email_failed(alert: &TimelineAlert, error: &str) -> Self {
        let mut note = Self::plain(
            format!("Email failed: {}", alert.vehicle_info),
            format!("Could not email the {} alert: {error}", alert.step.label()),
            format!("{}-email-failed", alert_tag(alert)),
        );
        note.alert_id = Some(alert.id);
        note
    }
}

/// `timeline-{vehicle_id}-{step}`
pub fn alert_tag(alert: &TimelineAlert) -> String {
    format!("timeline-{}-{}", alert.vehicle_id, alert.step)
}
