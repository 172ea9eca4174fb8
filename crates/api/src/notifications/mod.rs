//! Delivery of browser notifications to connected dashboards.
//!
//! The [`NotificationForwarder`] subscribes to the alert engine's
//! notification bus and pushes each notification to every WebSocket client.

pub mod forwarder;

pub use forwarder::NotificationForwarder;
