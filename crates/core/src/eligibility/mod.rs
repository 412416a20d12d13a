//! Eligibility rules engine.
//!
//! A criteria document wraps one root [`rules::GroupRule`]; groups combine
//! field comparisons and opaque SQL predicates with AND/OR logic at
//! arbitrary nesting depth.
//!
//! - [`fields`] — static catalog of evaluable subject fields
//! - [`rules`] — the rule tree model and its wire format
//! - [`validate`] — structural validation with node paths
//! - [`evaluator`] — short-circuiting evaluation, plain and traced
//! - [`edit`] — pure path-addressed tree edits

pub mod edit;
pub mod evaluator;
pub mod fields;
pub mod rules;
pub mod validate;
