//! Alert storage, notification delivery and escalation for the
//! reconditioning timeline.
//!
//! - [`store`] keeps one alert per vehicle and stage.
//! - [`dispatcher`] fans an alert out to browser, email and webhook channels.
//! - [`escalation`] arms delayed manager follow-ups.
//! - [`service`] ties them together with the persisted [`persistence::TimelineState`].

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod escalation;
pub mod persistence;
pub mod service;
pub mod store;

pub use bus::NotificationBus;
pub use dispatcher::{ChannelConfig, DispatchReport, NotificationDispatcher};
pub use escalation::EscalationScheduler;
pub use persistence::{PersistenceError, StateFile, TimelineState};
pub use service::{AlertService, DispatchedAlert, EvaluationOutcome};
pub use store::AlertStore;
