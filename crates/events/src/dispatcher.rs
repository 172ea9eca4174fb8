//! Alert notification fan-out.
//!
//! [`NotificationDispatcher`] delivers one alert through every enabled
//! channel. Channels run concurrently and independently: a failure on one
//! is logged and recorded in the [`DispatchReport`] but never stops the
//! others, and never propagates to the caller.

use std::sync::Arc;

use recon_core::alert::{AlertType, TimelineAlert};
use recon_core::channels::{CHANNEL_BROWSER, CHANNEL_EMAIL};
use recon_core::preferences::NotificationPreferences;
use recon_core::types::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::bus::NotificationBus;
use crate::delivery::browser::BrowserNotification;
use crate::delivery::email::{EmailMessage, EmailTransport};
use crate::delivery::webhook::{self, WebhookEndpoint, WebhookTransport};
use crate::delivery::{ChannelResult, Urgency};

/// Bus target name recorded for browser deliveries.
const BUS_TARGET: &str = "bus";

// ---------------------------------------------------------------------------
// ChannelConfig
// ---------------------------------------------------------------------------

/// Notification preferences with webhook URLs already classified.
///
/// Built once whenever preferences change so the dispatcher never has to
/// re-inspect URL strings per alert.
#[derive(Debug, Clone, Default)]
pub struct ChannelConfig {
    pub preferences: NotificationPreferences,
    pub webhooks: Vec<WebhookEndpoint>,
    pub manager_webhooks: Vec<WebhookEndpoint>,
}

impl ChannelConfig {
    pub fn from_preferences(preferences: NotificationPreferences) -> Self {
        let webhooks = WebhookEndpoint::resolve_all(&preferences.webhook.urls);
        let manager_webhooks =
            WebhookEndpoint::resolve_all(&preferences.escalation.manager_webhook_urls);
        Self {
            preferences,
            webhooks,
            manager_webhooks,
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchReport
// ---------------------------------------------------------------------------

/// What happened when an alert was dispatched.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub alert_id: Uuid,
    pub urgency: Urgency,
    /// Set when quiet hours held the alert back; `results` is then empty.
    pub suppressed: bool,
    pub results: Vec<ChannelResult>,
    /// Whether a browser "email failed" notice was published.
    pub email_fallback: bool,
}

impl DispatchReport {
    fn new(alert: &TimelineAlert, urgency: Urgency) -> Self {
        Self {
            alert_id: alert.id,
            urgency,
            suppressed: false,
            results: Vec::new(),
            email_fallback: false,
        }
    }

    pub fn delivered(&self, channel: &str) -> usize {
        self.results
            .iter()
            .filter(|r| r.channel == channel && r.is_success())
            .count()
    }

    pub fn failed(&self, channel: &str) -> usize {
        self.results
            .iter()
            .filter(|r| r.channel == channel && !r.is_success())
            .count()
    }
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

pub struct NotificationDispatcher {
    bus: Arc<NotificationBus>,
    email: Option<Arc<dyn EmailTransport>>,
    webhook: Arc<dyn WebhookTransport>,
}

impl NotificationDispatcher {
    /// Create a dispatcher without an email transport.
    pub fn new(bus: Arc<NotificationBus>, webhook: Arc<dyn WebhookTransport>) -> Self {
        Self {
            bus,
            email: None,
            webhook,
        }
    }

    /// Enable the email channel.
    pub fn with_email(mut self, email: Arc<dyn EmailTransport>) -> Self {
        self.email = Some(email);
        self
    }

    pub fn bus(&self) -> &Arc<NotificationBus> {
        &self.bus
    }

    /// Deliver a freshly raised alert through every enabled channel.
    ///
    /// Inside the quiet-hours window only overdue alerts go out.
    pub async fn dispatch(
        &self,
        alert: &TimelineAlert,
        channels: &ChannelConfig,
        now: Timestamp,
    ) -> DispatchReport {
        let urgency = Urgency::for_alert(alert);
        let prefs = &channels.preferences;
        let mut report = DispatchReport::new(alert, urgency);

        if alert.alert_type == AlertType::Warning && prefs.quiet_hours.contains(now) {
            tracing::debug!(alert_id = %alert.id, "Quiet hours, warning not dispatched");
            report.suppressed = true;
            return report;
        }

        let show_browser =
            prefs.browser.enabled && (urgency.is_critical() || !prefs.browser.critical_only);
        let recipients: Vec<String> = if prefs.email.enabled {
            prefs.email.recipient.iter().cloned().collect()
        } else {
            Vec::new()
        };
        let webhooks: &[WebhookEndpoint] = if prefs.webhook.enabled {
            &channels.webhooks
        } else {
            &[]
        };

        self.fan_out(
            alert,
            urgency,
            show_browser,
            prefs.browser.sound,
            &recipients,
            webhooks,
            &mut report,
        )
        .await;

        log_report(&report);
        report
    }

    /// Deliver the delayed follow-up for an unacknowledged critical alert to
    /// the manager contacts.
    pub async fn dispatch_escalation(
        &self,
        alert: &TimelineAlert,
        channels: &ChannelConfig,
    ) -> DispatchReport {
        let urgency = Urgency::Escalation;
        let prefs = &channels.preferences;
        let mut report = DispatchReport::new(alert, urgency);

        self.fan_out(
            alert,
            urgency,
            prefs.browser.enabled,
            prefs.browser.sound,
            &prefs.escalation.manager_emails,
            &channels.manager_webhooks,
            &mut report,
        )
        .await;

        log_report(&report);
        report
    }

    /// Run the three channels concurrently and merge their results.
    #[allow(clippy::too_many_arguments)]
    async fn fan_out(
        &self,
        alert: &TimelineAlert,
        urgency: Urgency,
        show_browser: bool,
        sound: bool,
        recipients: &[String],
        webhooks: &[WebhookEndpoint],
        report: &mut DispatchReport,
    ) {
        let browser = async {
            if !show_browser {
                return None;
            }
            let receivers = self
                .bus
                .publish(BrowserNotification::for_alert(alert, urgency, sound));
            tracing::debug!(alert_id = %alert.id, receivers, "Browser notification published");
            Some(ChannelResult::delivered(CHANNEL_BROWSER, BUS_TARGET))
        };
        let email = self.send_emails(alert, urgency, recipients);
        let hooks = webhook::deliver_all(self.webhook.as_ref(), webhooks, alert, urgency);

        let (browser, (email_results, fallback), hook_results) =
            tokio::join!(browser, email, hooks);

        report.results.extend(browser);
        report.results.extend(email_results);
        report.results.extend(hook_results);
        report.email_fallback = fallback;
    }

    /// Send one email per recipient. Any failure publishes a browser notice.
    async fn send_emails(
        &self,
        alert: &TimelineAlert,
        urgency: Urgency,
        recipients: &[String],
    ) -> (Vec<ChannelResult>, bool) {
        let Some(transport) = self.email.as_ref() else {
            if !recipients.is_empty() {
                tracing::debug!(alert_id = %alert.id, "Email channel enabled but SMTP not configured");
            }
            return (Vec::new(), false);
        };

        let sends = recipients.iter().map(|to| async move {
            let message = EmailMessage::for_alert(to, alert, urgency);
            match transport.send(&message).await {
                Ok(()) => ChannelResult::delivered(CHANNEL_EMAIL, to.as_str()),
                Err(e) => {
                    tracing::warn!(to = %to, alert_id = %alert.id, error = %e, "Alert email failed");
                    ChannelResult::failed(CHANNEL_EMAIL, to.as_str(), e)
                }
            }
        });
        let results = futures::future::join_all(sends).await;

        let mut fallback = false;
        if let Some(err) = results.iter().find_map(|r| r.error.as_deref()) {
            self.bus.publish(BrowserNotification::email_failed(alert, err));
            fallback = true;
        }
        (results, fallback)
    }
}

fn log_report(report: &DispatchReport) {
    let failures = report.results.iter().filter(|r| !r.is_success()).count();
    if failures > 0 {
        tracing::warn!(
            alert_id = %report.alert_id,
            urgency = report.urgency.label(),
            delivered = report.results.len() - failures,
            failures,
            "Alert dispatched with failures"
        );
    } else {
        tracing::info!(
            alert_id = %report.alert_id,
            urgency = report.urgency.label(),
            delivered = report.results.len(),
            "Alert dispatched"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use recon_core::alert::NewAlert;
    use recon_core::channels::CHANNEL_WEBHOOK;
    use recon_core::stage::Stage;

    use super::*;
    use crate::delivery::email::EmailError;
    use crate::delivery::webhook::WebhookError;

    #[derive(Default)]
    struct FakeWebhooks {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WebhookTransport for FakeWebhooks {
        async fn post_json(&self, url: &str, _: &serde_json::Value) -> Result<(), WebhookError> {
            self.urls.lock().unwrap().push(url.to_string());
            if url.contains("broken") {
                return Err(WebhookError::HttpStatus(503));
            }
            Ok(())
        }
    }

    struct FakeMailer {
        fail: bool,
        sent: Mutex<Vec<EmailMessage>>,
    }

    impl FakeMailer {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmailTransport for FakeMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(EmailError::Build("relay refused".to_string()));
            }
            Ok(())
        }
    }

    fn alert(alert_type: AlertType) -> TimelineAlert {
        TimelineAlert::from_new(
            NewAlert {
                vehicle_id: 21,
                vehicle_info: "2021 Chevrolet Tahoe".to_string(),
                vin: "1GNSKBKD0MR000001".to_string(),
                step: Stage::Shop,
                alert_type,
                current_days: 6,
                target_days: 5,
                message: "msg".to_string(),
            },
            Utc::now(),
        )
    }

    fn noon() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn all_channels() -> NotificationPreferences {
        let mut prefs = NotificationPreferences::default();
        prefs.email.enabled = true;
        prefs.email.recipient = Some("lot@example.com".to_string());
        prefs.webhook.enabled = true;
        prefs.webhook.urls = vec![
            "https://discord.com/api/webhooks/1/abc".to_string(),
            "https://broken.example.com/hook".to_string(),
        ];
        prefs
    }

    fn dispatcher(
        mailer: Option<Arc<FakeMailer>>,
    ) -> (NotificationDispatcher, Arc<NotificationBus>, Arc<FakeWebhooks>) {
        let bus = Arc::new(NotificationBus::default());
        let hooks = Arc::new(FakeWebhooks::default());
        let mut d = NotificationDispatcher::new(Arc::clone(&bus), hooks.clone());
        if let Some(m) = mailer {
            d = d.with_email(m);
        }
        (d, bus, hooks)
    }

    #[tokio::test]
    async fn overdue_alert_reaches_every_channel() {
        let mailer = Arc::new(FakeMailer::new(false));
        let (d, bus, hooks) = dispatcher(Some(mailer.clone()));
        let mut rx = bus.subscribe();

        let report = d
            .dispatch(
                &alert(AlertType::Overdue),
                &ChannelConfig::from_preferences(all_channels()),
                noon(),
            )
            .await;

        assert!(!report.suppressed);
        assert_eq!(report.delivered(CHANNEL_BROWSER), 1);
        assert_eq!(report.delivered(CHANNEL_EMAIL), 1);
        assert_eq!(report.delivered(CHANNEL_WEBHOOK), 1);
        assert_eq!(report.failed(CHANNEL_WEBHOOK), 1);
        assert_eq!(hooks.urls.lock().unwrap().len(), 2);
        assert_eq!(mailer.sent.lock().unwrap()[0].to, "lot@example.com");
        assert!(rx.recv().await.unwrap().title.starts_with("OVERDUE"));
    }

    #[tokio::test]
    async fn email_failure_falls_back_to_browser() {
        let mailer = Arc::new(FakeMailer::new(true));
        let (d, bus, _) = dispatcher(Some(mailer));
        let mut rx = bus.subscribe();

        let mut prefs = all_channels();
        prefs.browser.enabled = false;
        let report = d
            .dispatch(
                &alert(AlertType::Overdue),
                &ChannelConfig::from_preferences(prefs),
                noon(),
            )
            .await;

        assert!(report.email_fallback);
        assert_eq!(report.failed(CHANNEL_EMAIL), 1);
        let note = rx.recv().await.unwrap();
        assert!(note.title.starts_with("Email failed"));
        assert!(note.body.contains("relay refused"));
    }

    #[tokio::test]
    async fn critical_only_browser_skips_warnings() {
        let (d, bus, _) = dispatcher(None);
        let mut rx = bus.subscribe();

        let mut prefs = NotificationPreferences::default();
        prefs.browser.critical_only = true;
        let report = d
            .dispatch(
                &alert(AlertType::Warning),
                &ChannelConfig::from_preferences(prefs),
                noon(),
            )
            .await;

        assert_eq!(report.delivered(CHANNEL_BROWSER), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disabled_channels_are_not_invoked() {
        let mailer = Arc::new(FakeMailer::new(false));
        let (d, _, hooks) = dispatcher(Some(mailer.clone()));

        let mut prefs = all_channels();
        prefs.email.enabled = false;
        prefs.webhook.enabled = false;
        prefs.browser.enabled = false;
        let report = d
            .dispatch(
                &alert(AlertType::Overdue),
                &ChannelConfig::from_preferences(prefs),
                noon(),
            )
            .await;

        assert!(report.results.is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
        assert!(hooks.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_smtp_skips_email_silently() {
        let (d, _, _) = dispatcher(None);
        let report = d
            .dispatch(
                &alert(AlertType::Overdue),
                &ChannelConfig::from_preferences(all_channels()),
                noon(),
            )
            .await;
        assert_eq!(report.delivered(CHANNEL_EMAIL) + report.failed(CHANNEL_EMAIL), 0);
        assert!(!report.email_fallback);
    }

    #[tokio::test]
    async fn quiet_hours_hold_warnings_but_not_overdue() {
        let (d, _, hooks) = dispatcher(None);
        let mut prefs = all_channels();
        prefs.quiet_hours.enabled = true;
        prefs.quiet_hours.start_hour = 11;
        prefs.quiet_hours.end_hour = 13;
        let channels = ChannelConfig::from_preferences(prefs);

        let warning = d.dispatch(&alert(AlertType::Warning), &channels, noon()).await;
        assert!(warning.suppressed);
        assert!(hooks.urls.lock().unwrap().is_empty());

        let overdue = d.dispatch(&alert(AlertType::Overdue), &channels, noon()).await;
        assert!(!overdue.suppressed);
        assert_eq!(hooks.urls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn escalation_targets_manager_contacts() {
        let mailer = Arc::new(FakeMailer::new(false));
        let (d, bus, hooks) = dispatcher(Some(mailer.clone()));
        let mut rx = bus.subscribe();

        let mut prefs = all_channels();
        prefs.escalation.enabled = true;
        prefs.escalation.manager_emails =
            vec!["gm@example.com".to_string(), "ops@example.com".to_string()];
        prefs.escalation.manager_webhook_urls = vec!["https://hooks.slack.com/services/X".to_string()];

        let report = d
            .dispatch_escalation(
                &alert(AlertType::Overdue),
                &ChannelConfig::from_preferences(prefs),
            )
            .await;

        assert_eq!(report.urgency, Urgency::Escalation);
        assert_eq!(report.delivered(CHANNEL_EMAIL), 2);
        let sent = mailer.sent.lock().unwrap();
        assert!(sent.iter().all(|m| m.subject.contains("ESCALATION")));
        assert!(sent.iter().all(|m| m.to != "lot@example.com"));
        assert_eq!(
            hooks.urls.lock().unwrap().as_slice(),
            ["https://hooks.slack.com/services/X".to_string()]
        );
        assert!(rx.recv().await.unwrap().title.starts_with("ESCALATION"));
    }
}
