//! Notification preferences for timeline alerts.
//!
//! Each delivery channel carries its own enable flag and settings. SMTP
//! credentials are server configuration and live with the email delivery
//! service, not here.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidateUrl};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default escalation delay.
pub const DEFAULT_ESCALATION_DELAY_MINUTES: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BrowserPreferences {
    pub enabled: bool,
    /// Only overdue alerts reach the browser when set.
    pub critical_only: bool,
    /// Play a tone with each notification.
    pub sound: bool,
}

impl Default for BrowserPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            critical_only: false,
            sound: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EmailPreferences {
    pub enabled: bool,
    #[validate(email)]
    pub recipient: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WebhookPreferences {
    pub enabled: bool,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EscalationPreferences {
    pub enabled: bool,
    #[validate(range(min = 1, max = 1440))]
    pub delay_minutes: u32,
    pub manager_emails: Vec<String>,
    pub manager_webhook_urls: Vec<String>,
}

impl Default for EscalationPreferences {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_minutes: DEFAULT_ESCALATION_DELAY_MINUTES,
            manager_emails: Vec::new(),
            manager_webhook_urls: Vec::new(),
        }
    }
}

/// Window (UTC hours, end exclusive) during which only overdue alerts are
/// delivered. A window whose end is before its start wraps past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QuietHours {
    pub enabled: bool,
    #[validate(range(max = 23))]
    pub start_hour: u32,
    #[validate(range(max = 23))]
    pub end_hour: u32,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start_hour: 22,
            end_hour: 7,
        }
    }
}

impl QuietHours {
    pub fn contains(&self, at: Timestamp) -> bool {
        if !self.enabled || self.start_hour == self.end_hour {
            return false;
        }
        let hour = at.hour();
        if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// All per-channel settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NotificationPreferences {
    #[validate(nested)]
    pub browser: BrowserPreferences,
    #[validate(nested)]
    pub email: EmailPreferences,
    #[validate(nested)]
    pub webhook: WebhookPreferences,
    #[validate(nested)]
    pub escalation: EscalationPreferences,
    #[validate(nested)]
    pub quiet_hours: QuietHours,
}

impl NotificationPreferences {
    /// Validate field ranges and every address and URL.
    pub fn validated(self) -> Result<Self, CoreError> {
        self.validate()?;

        for url in self
            .webhook
            .urls
            .iter()
            .chain(self.escalation.manager_webhook_urls.iter())
        {
            if !url.validate_url() {
                return Err(CoreError::Validation(format!("Invalid webhook URL: {url}")));
            }
        }
        for email in &self.escalation.manager_emails {
            if !email.validate_email() {
                return Err(CoreError::Validation(format!(
                    "Invalid manager email: {email}"
                )));
            }
        }

        Ok(self)
    }
}
