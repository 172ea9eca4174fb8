//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the shared [`AlertService`](recon_events::AlertService)
//! (and `recon_db` for vehicle reads) and map errors via
//! [`AppError`](crate::error::AppError).

pub mod alerts;
pub mod notifications;
pub mod timeline;
