//! Email alert delivery via SMTP.
//!
//! [`SmtpEmailTransport`] wraps the `lettre` async SMTP transport. SMTP
//! settings are loaded from environment variables; if `SMTP_HOST` is not
//! set, [`EmailConfig::from_env`] returns `None` and the email channel is
//! left unconfigured.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use recon_core::alert::TimelineAlert;

use super::Urgency;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@recon.local";

/// Configuration for the SMTP email transport.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable         | Required | Default               |
    /// |------------------|----------|-----------------------|
    /// | `SMTP_HOST`      | yes      | -                     |
    /// | `SMTP_PORT`      | no       | `587`                 |
    /// | `SMTP_FROM`      | no       | `noreply@recon.local` |
    /// | `SMTP_USER`      | no       | -                     |
    /// | `SMTP_PASSWORD`  | no       | -                     |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Message rendering
// ---------------------------------------------------------------------------

/// A rendered plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// Fill the alert template for `to`.
    pub fn for_alert(to: &str, alert: &TimelineAlert, urgency: Urgency) -> Self {
        let subject = format!(
            "[Recon Timeline] {}: {}",
            urgency.label(),
            alert.vehicle_info
        );
        let mut body = String::new();
        if urgency == Urgency::Escalation {
            body.push_str("ESCALATION: this alert has not been acknowledged.\n\n");
        }
        body.push_str(&format!(
            "Vehicle: {}\nVIN: {}\nStage: {}\nStatus: {}\nDays in stage: {}\nTarget days: {}\n\n{}\n\nRaised: {}\n",
            alert.vehicle_info,
            alert.vin,
            alert.step.label(),
            alert.alert_type.as_str(),
            alert.current_days,
            alert.target_days,
            alert.message,
            alert.timestamp.to_rfc3339(),
        ));
        Self {
            to: to.to_string(),
            subject,
            body,
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Anything that can send an [`EmailMessage`].
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Sends alert emails through an SMTP relay.
pub struct SmtpEmailTransport {
    from_address: String,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailTransport {
    /// Build the relay transport. No connection is opened until the first send.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            from_address: config.from_address,
            mailer: builder.build(),
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(message.to.parse()?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.mailer.send(email).await?;

        tracing::info!(to = %message.to, subject = %message.subject, "Alert email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
