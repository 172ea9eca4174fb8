//! Domain core for the vehicle reconditioning timeline.
//!
//! Pure logic with no I/O: stage and goal definitions, elapsed-day
//! arithmetic, alert classification and notification preferences.

pub mod alert;
pub mod channels;
pub mod dates;
pub mod error;
pub mod goals;
pub mod preferences;
pub mod stage;
pub mod timeline;
pub mod types;
pub mod vehicle;
