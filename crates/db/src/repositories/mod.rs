//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod criteria_repo;

pub use criteria_repo::{CriteriaRepo, UpdateOutcome};
