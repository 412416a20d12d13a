//! Request handlers, grouped by resource.

pub mod criteria;
pub mod fields;
