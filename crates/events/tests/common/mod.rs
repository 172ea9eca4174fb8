#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use recon_core::alert::{AlertType, NewAlert};
use recon_core::stage::Stage;
use recon_core::types::Timestamp;
use recon_core::vehicle::Vehicle;
use recon_events::delivery::email::{EmailError, EmailMessage, EmailTransport};
use recon_events::delivery::webhook::{WebhookError, WebhookTransport};
use recon_events::{AlertService, NotificationBus, NotificationDispatcher};

/// Email transport that records messages and optionally fails every send.
#[derive(Default)]
pub struct RecordingMailer {
    pub fail: bool,
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.subject.clone())
            .collect()
    }
}

#[async_trait]
impl EmailTransport for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(EmailError::Build("mailbox unavailable".to_string()));
        }
        Ok(())
    }
}

/// Webhook transport that records URLs and never fails.
#[derive(Default)]
pub struct RecordingWebhooks {
    pub urls: Mutex<Vec<String>>,
}

#[async_trait]
impl WebhookTransport for RecordingWebhooks {
    async fn post_json(&self, url: &str, _: &serde_json::Value) -> Result<(), WebhookError> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub service: AlertService,
    pub bus: Arc<NotificationBus>,
    pub mailer: Arc<RecordingMailer>,
    pub webhooks: Arc<RecordingWebhooks>,
}

pub fn harness_with(mailer: RecordingMailer) -> Harness {
    let bus = Arc::new(NotificationBus::default());
    let mailer = Arc::new(mailer);
    let webhooks = Arc::new(RecordingWebhooks::default());
    let dispatcher = NotificationDispatcher::new(Arc::clone(&bus), webhooks.clone())
        .with_email(mailer.clone());
    Harness {
        service: AlertService::new(dispatcher),
        bus,
        mailer,
        webhooks,
    }
}

pub fn harness() -> Harness {
    harness_with(RecordingMailer::default())
}

pub fn new_alert(vehicle_id: i64, step: Stage, alert_type: AlertType, current: i64, target: i64) -> NewAlert {
    NewAlert {
        vehicle_id,
        vehicle_info: "2022 Toyota RAV4".to_string(),
        vin: format!("2T3P1RFV{vehicle_id:09}"),
        step,
        alert_type,
        current_days: current,
        target_days: target,
        message: format!("{} stage check", step.label()),
    }
}

/// A vehicle still in the shop that arrived `days_ago` days before `now`.
pub fn in_shop(id: i64, now: Timestamp, days_ago: i64) -> Vehicle {
    Vehicle {
        id,
        vin: format!("5YJ3E1EA{id:09}"),
        make: "Honda".to_string(),
        model: "Civic".to_string(),
        year: 2020,
        through_shop: false,
        detail_complete: false,
        photo_complete: false,
        shop_done: None,
        detail_done: None,
        photo_done: None,
        in_inventory: Some(now - Duration::days(days_ago)),
    }
}
