//! Crewgate domain core.
//!
//! Pure domain logic for the eligibility rules engine: the field catalog,
//! the rule tree model, structural validation, and evaluation. Everything
//! here is synchronous, has no database or HTTP dependencies, and never
//! mutates shared state, so it can be called from any number of tasks
//! without coordination.

pub mod eligibility;
pub mod error;
pub mod types;
