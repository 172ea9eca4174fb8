//! Webhook alert delivery.
//!
//! Each configured URL is classified once into a [`WebhookTarget`] that
//! decides the payload shape (Discord embed, Slack attachment, or a generic
//! JSON envelope). [`deliver_all`] POSTs to every endpoint concurrently and
//! settles all of them, so one bad URL never blocks the rest. There is a
//! single attempt per endpoint.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use recon_core::alert::TimelineAlert;
use recon_core::channels::CHANNEL_WEBHOOK;
use serde::Serialize;
use serde_json::json;

use super::{ChannelResult, Urgency};

/// Default HTTP request timeout for a single delivery attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Name shown as the sender in chat integrations.
const SENDER_NAME: &str = "Recon Timeline";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Payload family expected by the receiving service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookTarget {
    Discord,
    Slack,
    Generic,
}

impl WebhookTarget {
    /// Classify a URL by the service it points at.
    pub fn detect(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if lower.contains("discord") {
            WebhookTarget::Discord
        } else if lower.contains("slack") {
            WebhookTarget::Slack
        } else {
            WebhookTarget::Generic
        }
    }

    /// Build the JSON body for this target.
    pub fn payload(self, alert: &TimelineAlert, urgency: Urgency) -> serde_json::Value {
        match self {
            WebhookTarget::Discord => discord_payload(alert, urgency),
            WebhookTarget::Slack => slack_payload(alert, urgency),
            WebhookTarget::Generic => generic_payload(alert, urgency),
        }
    }
}

/// A URL with its payload family resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookEndpoint {
    pub url: String,
    pub target: WebhookTarget,
}

impl WebhookEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let target = WebhookTarget::detect(&url);
        Self { url, target }
    }

    /// Resolve a list of URLs, skipping blanks.
    pub fn resolve_all(urls: &[String]) -> Vec<Self> {
        urls.iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(Self::new)
            .collect()
    }
}

fn title(alert: &TimelineAlert, urgency: Urgency) -> String {
    format!("{}: {}", urgency.label(), alert.vehicle_info)
}

fn days_field(alert: &TimelineAlert) -> String {
    format!("{} / {}", alert.current_days, alert.target_days)
}

fn discord_color(urgency: Urgency) -> u32 {
    match urgency {
        Urgency::Warning => 0xF5_9E_0B,
        Urgency::Overdue => 0xDC_26_26,
        Urgency::Escalation => 0x7C_3A_ED,
    }
}

fn discord_payload(alert: &TimelineAlert, urgency: Urgency) -> serde_json::Value {
    let content = (urgency == Urgency::Escalation)
        .then_some("ESCALATION: timeline alert still unacknowledged");
    json!({
        "username": SENDER_NAME,
        "content": content,
        "embeds": [{
            "title": title(alert, urgency),
            "description": alert.message,
            "color": discord_color(urgency),
            "fields": [
                { "name": "VIN", "value": alert.vin, "inline": true },
                { "name": "Stage", "value": alert.step.label(), "inline": true },
                { "name": "Days", "value": days_field(alert), "inline": true },
            ],
            "timestamp": alert.timestamp.to_rfc3339(),
        }],
    })
}

fn slack_payload(alert: &TimelineAlert, urgency: Urgency) -> serde_json::Value {
    let color = if urgency.is_critical() {
        "danger"
    } else {
        "warning"
    };
    json!({
        "text": title(alert, urgency),
        "attachments": [{
            "color": color,
            "title": title(alert, urgency),
            "text": alert.message,
            "fields": [
                { "title": "VIN", "value": alert.vin, "short": true },
                { "title": "Stage", "value": alert.step.label(), "short": true },
                { "title": "Days", "value": days_field(alert), "short": true },
            ],
            "footer": SENDER_NAME,
            "ts": alert.timestamp.timestamp(),
        }],
    })
}

fn generic_payload(alert: &TimelineAlert, urgency: Urgency) -> serde_json::Value {
    json!({
        "event": "timeline_alert",
        "urgency": urgency,
        "escalation": urgency == Urgency::Escalation,
        "alert": alert,
        "sent_at": Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Anything that can POST a JSON body to a URL.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError>;
}

/// `reqwest`-backed transport.
pub struct HttpWebhookTransport {
    client: reqwest::Client,
}

impl HttpWebhookTransport {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhookTransport {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// POST `alert` to every endpoint concurrently and collect one result each.
pub async fn deliver_all(
    transport: &dyn WebhookTransport,
    endpoints: &[WebhookEndpoint],
    alert: &TimelineAlert,
    urgency: Urgency,
) -> Vec<ChannelResult> {
    let attempts = endpoints.iter().map(|endpoint| async move {
        let payload = endpoint.target.payload(alert, urgency);
        match transport.post_json(&endpoint.url, &payload).await {
            Ok(()) => {
                tracing::debug!(url = %endpoint.url, alert_id = %alert.id, "Webhook delivered");
                ChannelResult::delivered(CHANNEL_WEBHOOK, endpoint.url.as_str())
            }
            Err(e) => {
                tracing::warn!(
                    url = %endpoint.url,
                    alert_id = %alert.id,
                    error = %e,
                    "Webhook delivery failed"
                );
                ChannelResult::failed(CHANNEL_WEBHOOK, endpoint.url.as_str(), e)
            }
        }
    });

    futures::future::join_all(attempts).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
