//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod vehicle_repo;

pub use vehicle_repo::VehicleRepo;
