use crate::eligibility::validate::ValidationIssue;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A rule tree failed structural validation. Carries every issue found
    /// so callers can report all of them at once, each with its node path.
    #[error("Rule tree validation failed with {} issue(s)", .0.len())]
    RuleValidation(Vec<ValidationIssue>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
