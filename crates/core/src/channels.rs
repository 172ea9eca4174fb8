//! Well-known delivery channel names.
//!
//! Used as the `channel` field in dispatch reports and structured log
//! lines so operators can filter by channel.

/// Native browser notification pushed over the WebSocket.
pub const CHANNEL_BROWSER: &str = "browser";

/// Email delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// JSON POST to an external HTTP endpoint.
pub const CHANNEL_WEBHOOK: &str = "webhook";
