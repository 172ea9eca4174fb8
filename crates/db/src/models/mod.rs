//! Row types for database tables.

pub mod vehicle;
